// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named, capacity-bounded resource definitions

use crate::error::ConstraintError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the built-in single-permit constraint backing the queue step
pub const QUEUE_CONSTRAINT_NAME: &str = "Queuing";

/// Capacity of the built-in queue constraint
pub const QUEUE_CONSTRAINT_CAPACITY: u32 = 1;

/// Opaque identifier of a resource constraint
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintId(pub String);

impl ConstraintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Promotion policy for waiting consumers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Earlier registrations are served first regardless of size
    #[default]
    Fifo,
}

/// A named resource with a fixed number of permits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConstraint {
    pub id: ConstraintId,
    pub name: String,
    pub account_id: String,
    /// Total permits available at any instant, per unit
    pub capacity: u32,
    pub strategy: Strategy,
}

impl ResourceConstraint {
    /// Build a constraint, rejecting a zero capacity
    pub fn new(
        id: ConstraintId,
        account_id: impl Into<String>,
        name: impl Into<String>,
        capacity: u32,
    ) -> Result<Self, ConstraintError> {
        let name = name.into();
        if capacity == 0 {
            return Err(ConstraintError::InvalidRequest(format!(
                "resource constraint {name} must have a capacity of at least 1"
            )));
        }
        if name.trim().is_empty() {
            return Err(ConstraintError::InvalidRequest(
                "resource constraint name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            account_id: account_id.into(),
            capacity,
            strategy: Strategy::Fifo,
        })
    }

    /// The built-in queue constraint for an account
    pub fn queue(id: ConstraintId, account_id: impl Into<String>) -> Self {
        Self {
            id,
            name: QUEUE_CONSTRAINT_NAME.to_string(),
            account_id: account_id.into(),
            capacity: QUEUE_CONSTRAINT_CAPACITY,
            strategy: Strategy::Fifo,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Whether this record is the same definition as `name` in `account_id`
    pub fn matches(&self, account_id: &str, name: &str) -> bool {
        self.account_id == account_id && self.name == name
    }
}

#[cfg(test)]
#[path = "constraint_tests.rs"]
mod tests;
