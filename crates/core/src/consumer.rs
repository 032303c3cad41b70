// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquisition attempts against a (constraint, unit) pair

use crate::constraint::ConstraintId;
use crate::scope::HoldingScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a consumer; doubles as the step's suspension token
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(pub String);

impl ConsumerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification computed by the evaluator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerState {
    /// Holds its permits
    Active,
    /// Waiting for capacity
    Blocked,
    /// Never satisfiable; not produced by registration, kept for stored data
    Rejected,
}

impl ConsumerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumerState::Active => "ACTIVE",
            ConsumerState::Blocked => "BLOCKED",
            ConsumerState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who holds a consumer's permits and since when
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerContext {
    pub release_entity_type: HoldingScope,
    pub release_entity_id: String,
    pub created_at: DateTime<Utc>,
}

/// One outstanding or satisfied acquisition attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: ConsumerId,
    pub constraint_id: ConstraintId,
    pub unit: String,
    pub permits: u32,
    pub state: ConsumerState,
    /// FIFO key, increasing per constraint
    pub order: u64,
    /// The step that asked for the permits
    pub claimant_id: String,
    pub context: ConsumerContext,
}

impl Consumer {
    pub fn is_active(&self) -> bool {
        self.state == ConsumerState::Active
    }

    pub fn is_blocked(&self) -> bool {
        self.state == ConsumerState::Blocked
    }

    pub fn release_entity_id(&self) -> &str {
        &self.context.release_entity_id
    }

    pub fn unit_key(&self) -> UnitKey {
        UnitKey::new(self.constraint_id.clone(), self.unit.clone())
    }
}

/// The (constraint, unit) pair capacity is enforced on
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitKey {
    pub constraint_id: ConstraintId,
    pub unit: String,
}

impl UnitKey {
    pub fn new(constraint_id: ConstraintId, unit: impl Into<String>) -> Self {
        Self {
            constraint_id,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.constraint_id, self.unit)
    }
}
