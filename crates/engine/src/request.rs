// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step parameters as handed over by the workflow engine

use restraint_core::{AcquireMode, HoldingScope, QUEUE_CONSTRAINT_NAME};
use serde::{Deserialize, Serialize};

/// Which step type requested the permits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Single-slot queue keyed by the resource unit; uses the account's
    /// built-in `Queuing` constraint, created on first use
    Queue,
    /// Named constraint that must already exist
    #[default]
    ResourceConstraint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepParameters {
    pub kind: StepKind,
    /// Constraint name
    pub name: String,
    /// Unit expression, rendered against the execution context
    pub resource_unit: String,
    pub permits: u32,
    #[serde(default)]
    pub acquire_mode: AcquireMode,
    #[serde(default)]
    pub holding_scope: HoldingScope,
    /// Identifies the requesting step in events
    pub claimant_id: String,
}

impl StepParameters {
    pub fn resource_constraint(
        name: impl Into<String>,
        resource_unit: impl Into<String>,
        permits: u32,
        claimant_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: StepKind::ResourceConstraint,
            name: name.into(),
            resource_unit: resource_unit.into(),
            permits,
            acquire_mode: AcquireMode::Ensure,
            holding_scope: HoldingScope::Plan,
            claimant_id: claimant_id.into(),
        }
    }

    pub fn queue(key: impl Into<String>, claimant_id: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Queue,
            name: QUEUE_CONSTRAINT_NAME.to_string(),
            resource_unit: key.into(),
            permits: 1,
            acquire_mode: AcquireMode::Ensure,
            holding_scope: HoldingScope::Plan,
            claimant_id: claimant_id.into(),
        }
    }

    /// Name of the constraint the request is gated on. Queue steps always
    /// use the built-in queue constraint.
    pub fn constraint_name(&self) -> &str {
        match self.kind {
            StepKind::Queue => QUEUE_CONSTRAINT_NAME,
            StepKind::ResourceConstraint => &self.name,
        }
    }

    pub fn with_acquire_mode(mut self, acquire_mode: AcquireMode) -> Self {
        self.acquire_mode = acquire_mode;
        self
    }

    pub fn with_holding_scope(mut self, holding_scope: HoldingScope) -> Self {
        self.holding_scope = holding_scope;
        self
    }
}
