// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Constraint store: the shared source of truth for constraints and consumers
//!
//! Every consumer-set mutation is a compare-and-swap on the unit's version.
//! Callers load a [`UnitSnapshot`], compute the new set, and commit it with
//! the version they read; a concurrent writer makes the commit fail with
//! [`StoreError::VersionConflict`] and the caller retries from a fresh load.

use crate::operation::Operation;
use crate::state::{MaterializedState, UnitSnapshot};
use crate::wal::{Wal, WalError};
use async_trait::async_trait;
use restraint_core::{ConstraintId, Consumer, ResourceConstraint, UnitKey};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors from constraint store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: UnitKey,
        expected: u64,
        actual: u64,
    },
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
}

impl StoreError {
    /// Whether retrying from a fresh read may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Durable record of constraints and their consumers
#[async_trait]
pub trait ConstraintStore: Send + Sync + 'static {
    /// Store `constraint` unless its account already has one with that name.
    ///
    /// Returns whichever record is stored afterwards.
    async fn create_constraint_if_absent(
        &self,
        constraint: ResourceConstraint,
    ) -> Result<ResourceConstraint, StoreError>;

    async fn constraint(&self, id: &ConstraintId) -> Result<Option<ResourceConstraint>, StoreError>;

    async fn constraint_by_name(
        &self,
        account_id: &str,
        name: &str,
    ) -> Result<Option<ResourceConstraint>, StoreError>;

    /// Hand out the next order number for a constraint
    async fn reserve_order(&self, constraint_id: &ConstraintId) -> Result<u64, StoreError>;

    async fn load_unit(&self, key: &UnitKey) -> Result<UnitSnapshot, StoreError>;

    /// Replace the consumers of a unit if its version is still `expected_version`.
    ///
    /// Returns the new version.
    async fn commit_unit(
        &self,
        key: &UnitKey,
        expected_version: u64,
        consumers: Vec<Consumer>,
    ) -> Result<u64, StoreError>;

    /// Consumers in any state held under a release entity
    async fn consumers_for_release_entity(
        &self,
        release_entity_id: &str,
    ) -> Result<Vec<Consumer>, StoreError>;

    /// Every unit that currently has consumers
    async fn occupied_units(&self) -> Result<Vec<UnitSnapshot>, StoreError>;

    async fn constraint_count(&self) -> Result<usize, StoreError>;
}

/// Where applied operations are recorded before they take effect
pub trait Journal: Send + 'static {
    fn record(&mut self, op: &Operation) -> Result<(), StoreError>;
}

/// Keeps nothing; state lives only in memory
#[derive(Debug, Default)]
pub struct NoJournal;

impl Journal for NoJournal {
    fn record(&mut self, _op: &Operation) -> Result<(), StoreError> {
        Ok(())
    }
}

impl Journal for Wal {
    fn record(&mut self, op: &Operation) -> Result<(), StoreError> {
        self.append(op)?;
        Ok(())
    }
}

struct Inner<J> {
    journal: J,
    state: MaterializedState,
}

impl<J: Journal> Inner<J> {
    fn apply(&mut self, op: Operation) -> Result<(), StoreError> {
        self.journal.record(&op)?;
        self.state.apply(&op);
        Ok(())
    }
}

/// Constraint store over materialized state and a journal.
///
/// Clones share the same state.
pub struct StateStore<J> {
    inner: Arc<Mutex<Inner<J>>>,
}

impl<J> Clone for StateStore<J> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// In-process store, shared by cloning
pub type MemoryStore = StateStore<NoJournal>;

/// Store persisted to a write-ahead log and rebuilt by replay on open
pub type WalStore = StateStore<Wal>;

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_journal(NoJournal, MaterializedState::new())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WalStore {
    /// Open or create a store backed by the WAL at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let wal = Wal::open(path)?;
        let mut state = MaterializedState::new();
        let ops = Wal::replay(path)?;
        for op in &ops {
            state.apply(op);
        }
        tracing::info!(
            path = %path.display(),
            operations = ops.len(),
            constraints = state.constraint_count(),
            "constraint store recovered"
        );
        Ok(Self::with_journal(wal, state))
    }
}

impl<J: Journal> StateStore<J> {
    fn with_journal(journal: J, state: MaterializedState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { journal, state })),
        }
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner<J>) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut inner)
    }
}

#[async_trait]
impl<J: Journal> ConstraintStore for StateStore<J> {
    async fn create_constraint_if_absent(
        &self,
        constraint: ResourceConstraint,
    ) -> Result<ResourceConstraint, StoreError> {
        self.with_inner(|inner| {
            if let Some(existing) = inner
                .state
                .constraint_by_name(&constraint.account_id, &constraint.name)
            {
                return Ok(existing.clone());
            }
            inner.apply(Operation::ConstraintCreate {
                constraint: constraint.clone(),
            })?;
            Ok(constraint)
        })
    }

    async fn constraint(&self, id: &ConstraintId) -> Result<Option<ResourceConstraint>, StoreError> {
        Ok(self.with_inner(|inner| inner.state.constraint(id).cloned()))
    }

    async fn constraint_by_name(
        &self,
        account_id: &str,
        name: &str,
    ) -> Result<Option<ResourceConstraint>, StoreError> {
        Ok(self.with_inner(|inner| inner.state.constraint_by_name(account_id, name).cloned()))
    }

    async fn reserve_order(&self, constraint_id: &ConstraintId) -> Result<u64, StoreError> {
        self.with_inner(|inner| {
            let order = inner.state.last_order(constraint_id) + 1;
            inner.apply(Operation::OrderReserve {
                constraint_id: constraint_id.clone(),
                order,
            })?;
            Ok(order)
        })
    }

    async fn load_unit(&self, key: &UnitKey) -> Result<UnitSnapshot, StoreError> {
        Ok(self.with_inner(|inner| inner.state.unit(key)))
    }

    async fn commit_unit(
        &self,
        key: &UnitKey,
        expected_version: u64,
        consumers: Vec<Consumer>,
    ) -> Result<u64, StoreError> {
        self.with_inner(|inner| {
            let actual = inner.state.unit_version(key);
            if actual != expected_version {
                return Err(StoreError::VersionConflict {
                    key: key.clone(),
                    expected: expected_version,
                    actual,
                });
            }
            let version = actual + 1;
            inner.apply(Operation::UnitCommit {
                key: key.clone(),
                version,
                consumers,
            })?;
            Ok(version)
        })
    }

    async fn consumers_for_release_entity(
        &self,
        release_entity_id: &str,
    ) -> Result<Vec<Consumer>, StoreError> {
        Ok(self.with_inner(|inner| inner.state.consumers_for_release_entity(release_entity_id)))
    }

    async fn occupied_units(&self) -> Result<Vec<UnitSnapshot>, StoreError> {
        Ok(self.with_inner(|inner| inner.state.occupied_units()))
    }

    async fn constraint_count(&self) -> Result<usize, StoreError> {
        Ok(self.with_inner(|inner| inner.state.constraint_count()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
