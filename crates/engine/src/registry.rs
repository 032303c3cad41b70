// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Constraint registry: lazy creation and lookup of named constraints

use crate::error::StepError;
use restraint_core::{IdGen, ResourceConstraint};
use restraint_storage::ConstraintStore;
use std::sync::Arc;

/// Creates constraints on first use and resolves them by name
pub struct ConstraintRegistry<S, I> {
    store: Arc<S>,
    ids: I,
}

impl<S, I: Clone> Clone for ConstraintRegistry<S, I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ids: self.ids.clone(),
        }
    }
}

impl<S: ConstraintStore, I: IdGen> ConstraintRegistry<S, I> {
    pub fn new(store: Arc<S>, ids: I) -> Self {
        Self { store, ids }
    }

    /// Create the named constraint unless the account already has it.
    ///
    /// An existing constraint is returned unchanged, capacity included.
    pub async fn ensure_constraint(
        &self,
        account_id: &str,
        name: &str,
        capacity: u32,
    ) -> Result<ResourceConstraint, StepError> {
        if let Some(existing) = self.store.constraint_by_name(account_id, name).await? {
            return Ok(existing);
        }
        let candidate =
            ResourceConstraint::new(self.ids.next_constraint_id(), account_id, name, capacity)?;
        let stored = self.store.create_constraint_if_absent(candidate).await?;
        if stored.capacity != capacity {
            tracing::debug!(
                account_id,
                name,
                capacity = stored.capacity,
                requested = capacity,
                "constraint already exists with another capacity"
            );
        } else {
            tracing::info!(constraint_id = %stored.id, account_id, name, capacity, "constraint ready");
        }
        Ok(stored)
    }

    /// The built-in single-slot queue constraint of an account
    pub async fn ensure_queue_constraint(
        &self,
        account_id: &str,
    ) -> Result<ResourceConstraint, StepError> {
        let candidate = ResourceConstraint::queue(self.ids.next_constraint_id(), account_id);
        if let Some(existing) = self
            .store
            .constraint_by_name(account_id, &candidate.name)
            .await?
        {
            return Ok(existing);
        }
        Ok(self.store.create_constraint_if_absent(candidate).await?)
    }

    pub async fn by_name(
        &self,
        account_id: &str,
        name: &str,
    ) -> Result<Option<ResourceConstraint>, StepError> {
        Ok(self.store.constraint_by_name(account_id, name).await?)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
