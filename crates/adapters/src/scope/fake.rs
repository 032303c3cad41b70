// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scope adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ScopeAdapter, ScopeError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Recorded status lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeCall {
    pub release_entity_id: String,
}

#[derive(Default)]
struct FakeScopeState {
    finished: HashSet<String>,
    failing: HashSet<String>,
    calls: Vec<ScopeCall>,
}

/// Fake scope adapter with scripted finished entities
#[derive(Clone, Default)]
pub struct FakeScopeAdapter {
    inner: Arc<Mutex<FakeScopeState>>,
}

impl FakeScopeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a release entity as finished
    pub fn finish(&self, release_entity_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .finished
            .insert(release_entity_id.to_string());
    }

    /// Make lookups for a release entity fail
    pub fn fail_lookup(&self, release_entity_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failing
            .insert(release_entity_id.to_string());
    }

    /// Get all recorded lookups
    pub fn calls(&self) -> Vec<ScopeCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }
}

#[async_trait]
impl ScopeAdapter for FakeScopeAdapter {
    async fn is_finished(&self, release_entity_id: &str) -> Result<bool, ScopeError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(ScopeCall {
            release_entity_id: release_entity_id.to_string(),
        });
        if inner.failing.contains(release_entity_id) {
            return Err(ScopeError::LookupFailed {
                entity: release_entity_id.to_string(),
                message: "scripted failure".to_string(),
            });
        }
        Ok(inner.finished.contains(release_entity_id))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
