// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Holding scopes, acquire modes, and the execution context they read
//!
//! A holding scope decides which workflow entity "owns" the permits a step
//! acquires. Permits are released in bulk when that entity ends, and an
//! `Ensure` acquisition subtracts whatever the entity already holds.

use crate::error::ConstraintError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Granularity at which permits are grouped
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldingScope {
    /// The whole execution holds the permits until it ends
    #[default]
    Plan,
    /// A single stage holds the permits until that stage ends
    Stage,
}

impl HoldingScope {
    /// Combine the scope kind with the matching id from the execution context
    pub fn release_entity_id(&self, ctx: &ExecutionContext) -> Result<String, ConstraintError> {
        match self {
            HoldingScope::Plan => Ok(ctx.plan_execution_id.clone()),
            HoldingScope::Stage => {
                let stage = ctx.stage_execution_id.as_deref().ok_or_else(|| {
                    ConstraintError::InvalidRequest(format!(
                        "stage holding scope used outside a stage in execution {}",
                        ctx.plan_execution_id
                    ))
                })?;
                Ok(stage_release_entity_id(&ctx.plan_execution_id, stage))
            }
        }
    }
}

impl fmt::Display for HoldingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldingScope::Plan => f.write_str("PLAN"),
            HoldingScope::Stage => f.write_str("STAGE"),
        }
    }
}

/// Release entity id for a stage within an execution
pub fn stage_release_entity_id(plan_execution_id: &str, stage_execution_id: &str) -> String {
    format!("{plan_execution_id}|{stage_execution_id}")
}

/// How requested permits relate to permits the scope already holds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquireMode {
    /// Top up to the requested amount; repeated requests are idempotent
    #[default]
    Ensure,
    /// Always request the full amount on top of what is held
    Accumulate,
}

impl AcquireMode {
    /// Permits still to acquire, given what the scope already holds.
    ///
    /// Zero means nothing needs to be registered.
    pub fn effective_permits(&self, requested: u32, already_held: u32) -> u32 {
        match self {
            AcquireMode::Ensure => requested.saturating_sub(already_held),
            AcquireMode::Accumulate => requested,
        }
    }
}

/// The slice of the calling execution the restraint core needs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub account_id: String,
    pub plan_execution_id: String,
    pub stage_execution_id: Option<String>,
    pub node_execution_id: String,
    /// Values available to expression rendering
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn new(
        account_id: impl Into<String>,
        plan_execution_id: impl Into<String>,
        node_execution_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            plan_execution_id: plan_execution_id.into(),
            stage_execution_id: None,
            node_execution_id: node_execution_id.into(),
            variables: HashMap::new(),
        }
    }

    pub fn with_stage(mut self, stage_execution_id: impl Into<String>) -> Self {
        self.stage_execution_id = Some(stage_execution_id.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
