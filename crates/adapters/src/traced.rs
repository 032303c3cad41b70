// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{NotifyAdapter, NotifyError};
use crate::scope::{ScopeAdapter, ScopeError};
use async_trait::async_trait;
use restraint_core::Event;
use tracing::Instrument;

/// Wrapper that adds tracing to any ScopeAdapter
#[derive(Clone)]
pub struct TracedScopeAdapter<S> {
    inner: S,
}

impl<S> TracedScopeAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: ScopeAdapter> ScopeAdapter for TracedScopeAdapter<S> {
    async fn is_finished(&self, release_entity_id: &str) -> Result<bool, ScopeError> {
        let span = tracing::info_span!("scope.is_finished", release_entity_id);

        async {
            let start = std::time::Instant::now();
            let result = self.inner.is_finished(release_entity_id).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(finished) => tracing::debug!(
                    finished,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "scope status"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "scope lookup failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn notify(&self, event: Event) -> Result<(), NotifyError> {
        let consumer_id = event
            .consumer_id()
            .map(|id| id.to_string())
            .unwrap_or_default();
        let span = tracing::info_span!("notify", event = event.name(), consumer_id = %consumer_id);

        async {
            let result = self.inner.notify(event).await;
            match &result {
                Ok(()) => tracing::debug!("delivered"),
                Err(e) => tracing::warn!(error = %e, "delivery failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
