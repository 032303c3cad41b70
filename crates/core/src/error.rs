// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds raised while evaluating and registering consumers

use thiserror::Error;

/// Errors surfaced to the step that requested permits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("invalid permits: {permits} (must be at least 1)")]
    InvalidPermits { permits: u32 },

    #[error("consumer requesting {permits} permits can never run under capacity {capacity}")]
    PermanentlyBlockedConsumer { permits: u32, capacity: u32 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unable to register consumer for {unit} after {attempts} attempts")]
    UnableToRegisterConsumer { unit: String, attempts: u32 },
}

impl ConstraintError {
    /// User and configuration errors; retrying the same request cannot succeed
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConstraintError::InvalidPermits { .. }
                | ConstraintError::PermanentlyBlockedConsumer { .. }
                | ConstraintError::InvalidRequest(_)
        )
    }
}
