// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations recorded in the log and applied to materialized state

use restraint_core::{ConstraintId, Consumer, ResourceConstraint, UnitKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Record a constraint definition; ignored if the name is taken
    ConstraintCreate { constraint: ResourceConstraint },
    /// Advance the order counter of a constraint
    OrderReserve {
        constraint_id: ConstraintId,
        order: u64,
    },
    /// Replace the consumer set of a unit at a new version
    UnitCommit {
        key: UnitKey,
        version: u64,
        consumers: Vec<Consumer>,
    },
}
