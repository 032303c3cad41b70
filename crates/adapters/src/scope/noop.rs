// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op scope adapter

use super::{ScopeAdapter, ScopeError};
use async_trait::async_trait;

/// Reports every release entity as still running.
///
/// Only the entity named in a scope-ended notification is swept.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpScopeAdapter;

impl NoOpScopeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScopeAdapter for NoOpScopeAdapter {
    async fn is_finished(&self, _release_entity_id: &str) -> Result<bool, ScopeError> {
        Ok(false)
    }
}
