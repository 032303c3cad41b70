// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the restraint engine

use restraint_core::{ConstraintError, UnitKey};
use restraint_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by step handlers and reconciliation
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("gave up reconciling {key} after {attempts} conflicting writes")]
    Contended { key: UnitKey, attempts: u32 },
}

impl StepError {
    /// User and configuration errors; the step should fail without retry
    pub fn is_user_error(&self) -> bool {
        match self {
            StepError::Constraint(e) => e.is_user_error(),
            StepError::Store(_) | StepError::Contended { .. } => false,
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        StepError::Constraint(ConstraintError::InvalidRequest(message.into()))
    }
}
