// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation observer
//!
//! Runs on its own tokio task. When a scope ends, every unit holding
//! consumers of that scope is swept and its waiters promoted. Failures are
//! logged and never reach the scope that ended.

use crate::error::StepError;
use crate::reconcile::{ReconcileReport, Reconciler};
use async_trait::async_trait;
use restraint_adapters::{NotifyAdapter, NotifyError, ScopeAdapter};
use restraint_core::{Event, UnitKey};
use restraint_storage::ConstraintStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Work queued for the observer task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObserverRequest {
    ScopeEnded { release_entity_id: String },
    /// A consumer was removed from this unit outside a scope ending
    UnitReleased { key: UnitKey },
}

pub struct ReconciliationObserver<S, N, P> {
    reconciler: Reconciler<S, N, P>,
}

impl<S, N, P> ReconciliationObserver<S, N, P>
where
    S: ConstraintStore,
    N: NotifyAdapter,
    P: ScopeAdapter,
{
    pub fn new(store: Arc<S>, notify: N, scopes: P, max_attempts: u32) -> Self {
        Self {
            reconciler: Reconciler::new(store, notify, scopes, max_attempts),
        }
    }

    /// Sweep every unit holding consumers of the ending release entity
    pub async fn on_scope_ended(
        &self,
        release_entity_id: &str,
    ) -> Result<ReconcileReport, StepError> {
        let held = self
            .reconciler
            .store()
            .consumers_for_release_entity(release_entity_id)
            .await?;
        let keys: BTreeSet<UnitKey> = held.iter().map(|c| c.unit_key()).collect();
        tracing::debug!(release_entity_id, units = keys.len(), "scope ended");

        let mut report = ReconcileReport::default();
        for key in keys {
            match self
                .reconciler
                .reconcile_unit(&key, Some(release_entity_id))
                .await
            {
                Ok(unit_report) => report.merge(unit_report),
                Err(e) => {
                    tracing::warn!(unit = %key, release_entity_id, error = %e, "reconcile failed");
                }
            }
        }
        Ok(report)
    }

    /// Reconcile a single unit
    pub async fn process_unit(&self, key: &UnitKey) -> Result<ReconcileReport, StepError> {
        self.reconciler.reconcile_unit(key, None).await
    }

    async fn handle(&self, request: ObserverRequest) {
        let result = match &request {
            ObserverRequest::ScopeEnded { release_entity_id } => {
                self.on_scope_ended(release_entity_id).await
            }
            ObserverRequest::UnitReleased { key } => self.process_unit(key).await,
        };
        if let Err(e) = result {
            tracing::warn!(?request, error = %e, "observer request failed");
        }
    }

    /// Start the observer task.
    ///
    /// The task stops once every handle is dropped and the queue drains.
    pub fn spawn(self, channel_capacity: usize) -> (ObserverHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(channel_capacity.max(1));
        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                self.handle(request).await;
            }
            tracing::debug!("observer stopped");
        });
        (ObserverHandle { tx }, task)
    }
}

/// Cheap handle for queueing work on the observer task
#[derive(Clone, Debug)]
pub struct ObserverHandle {
    tx: mpsc::Sender<ObserverRequest>,
}

impl ObserverHandle {
    /// Hook for the workflow engine when a plan or stage ends.
    ///
    /// Returns whether the request was queued. A dropped request is picked
    /// up later by the persistence monitor.
    pub fn scope_ended(&self, release_entity_id: &str) -> bool {
        self.submit(ObserverRequest::ScopeEnded {
            release_entity_id: release_entity_id.to_string(),
        })
    }

    pub fn unit_released(&self, key: UnitKey) -> bool {
        self.submit(ObserverRequest::UnitReleased { key })
    }

    fn submit(&self, request: ObserverRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(request)) => {
                tracing::warn!(?request, "observer queue full, dropping request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                tracing::warn!(?request, "observer stopped, dropping request");
                false
            }
        }
    }

    /// Wrap a notify adapter so released consumers and ended scopes are
    /// also queued for reconciliation
    pub fn route<N: NotifyAdapter>(&self, inner: N) -> RoutingNotifyAdapter<N> {
        RoutingNotifyAdapter {
            inner,
            observer: self.clone(),
        }
    }
}

/// Notify adapter that feeds the observer before delivering
#[derive(Clone, Debug)]
pub struct RoutingNotifyAdapter<N> {
    inner: N,
    observer: ObserverHandle,
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for RoutingNotifyAdapter<N> {
    async fn notify(&self, event: Event) -> Result<(), NotifyError> {
        match &event {
            Event::ConsumerReleased {
                constraint_id,
                unit,
                ..
            } => {
                self.observer
                    .unit_released(UnitKey::new(constraint_id.clone(), unit.clone()));
            }
            Event::ScopeEnded { release_entity_id } => {
                self.observer.scope_ended(release_entity_id);
            }
            _ => {}
        }
        self.inner.notify(event).await
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
