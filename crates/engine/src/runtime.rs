// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime wiring for the restraint engine
//!
//! Builds the queue step, starts the reconciliation observer and the
//! persistence monitor, and hands out the hooks the workflow engine calls.

use crate::config::EngineConfig;
use crate::error::StepError;
use crate::monitor::{PersistenceMonitor, RestraintStats};
use crate::observer::{ObserverHandle, ReconciliationObserver, RoutingNotifyAdapter};
use crate::registry::ConstraintRegistry;
use crate::step::QueueStep;
use restraint_adapters::{ExpressionRenderer, NotifyAdapter, ScopeAdapter};
use restraint_core::{Clock, IdGen};
use restraint_storage::ConstraintStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Runtime adapter dependencies
pub struct RuntimeDeps<S, N, R, P> {
    pub store: Arc<S>,
    pub notify: N,
    pub renderer: R,
    pub scopes: P,
}

/// Running restraint engine
pub struct Runtime<S, N, R, C, I> {
    step: QueueStep<S, RoutingNotifyAdapter<N>, R, C, I>,
    store: Arc<S>,
    observer: ObserverHandle,
    observer_task: JoinHandle<()>,
    monitor_task: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl<S, N, R, C, I> Runtime<S, N, R, C, I>
where
    S: ConstraintStore,
    N: NotifyAdapter,
    R: ExpressionRenderer,
    C: Clock,
    I: IdGen,
{
    /// Start background tasks. Must be called inside a tokio runtime.
    pub fn start<P: ScopeAdapter>(
        deps: RuntimeDeps<S, N, R, P>,
        config: &EngineConfig,
        clock: C,
        ids: I,
    ) -> Self {
        let observer = ReconciliationObserver::new(
            Arc::clone(&deps.store),
            deps.notify.clone(),
            deps.scopes.clone(),
            config.observer.max_attempts,
        );
        let (handle, observer_task) = observer.spawn(config.observer.channel_capacity);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let monitor_task = if config.monitor.enabled {
            let monitor = PersistenceMonitor::new(
                Arc::clone(&deps.store),
                deps.notify.clone(),
                deps.scopes,
                config.observer.max_attempts,
                &config.monitor,
            );
            Some(tokio::spawn(monitor.run(shutdown_rx)))
        } else {
            None
        };

        let step = QueueStep::new(
            Arc::clone(&deps.store),
            handle.route(deps.notify),
            deps.renderer,
            clock,
            ids,
            config.registration.clone(),
        );

        tracing::info!(
            monitor = config.monitor.enabled,
            interval = ?config.monitor.interval,
            "restraint runtime started"
        );

        Self {
            step,
            store: deps.store,
            observer: handle,
            observer_task,
            monitor_task,
            shutdown,
        }
    }

    pub fn step(&self) -> &QueueStep<S, RoutingNotifyAdapter<N>, R, C, I> {
        &self.step
    }

    pub fn registry(&self) -> &ConstraintRegistry<S, I> {
        self.step.registry()
    }

    /// Hook for the workflow engine when a plan or stage ends
    pub fn scope_ended(&self, release_entity_id: &str) -> bool {
        self.observer.scope_ended(release_entity_id)
    }

    pub fn observer(&self) -> &ObserverHandle {
        &self.observer
    }

    pub async fn stats(&self) -> Result<RestraintStats, StepError> {
        RestraintStats::collect(self.store.as_ref()).await
    }

    /// Stop the monitor and let the observer drain its queue
    pub async fn shutdown(self) {
        let Runtime {
            step,
            observer,
            observer_task,
            monitor_task,
            shutdown,
            ..
        } = self;

        let _ = shutdown.send(true);
        if let Some(task) = monitor_task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "monitor task failed");
            }
        }

        // The step's notifier holds a handle too
        drop(step);
        drop(observer);
        if let Err(e) = observer_task.await {
            tracing::warn!(error = %e, "observer task failed");
        }
        tracing::info!("restraint runtime stopped");
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
