// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lookup of release entity status in the workflow engine
//!
//! A release entity is a plan execution id, or `"{plan}|{stage}"` for
//! stage-scoped holds. Permits held under a finished entity are swept.

mod noop;

pub use noop::NoOpScopeAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeScopeAdapter, ScopeCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from scope status lookups
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("lookup failed for {entity}: {message}")]
    LookupFailed { entity: String, message: String },
}

/// Adapter answering "has this release entity finished?"
#[async_trait]
pub trait ScopeAdapter: Clone + Send + Sync + 'static {
    async fn is_finished(&self, release_entity_id: &str) -> Result<bool, ScopeError>;
}
