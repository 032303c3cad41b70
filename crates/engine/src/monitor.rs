// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence monitor: periodic sweep of units with waiting consumers
//!
//! Catches waiters whose scope-ended notification was lost, e.g. because
//! the observer queue was full or the process restarted mid-reconcile.

use crate::config::MonitorConfig;
use crate::error::StepError;
use crate::reconcile::{ReconcileReport, Reconciler};
use restraint_adapters::{NotifyAdapter, ScopeAdapter};
use restraint_core::ConsumerState;
use restraint_storage::ConstraintStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct PersistenceMonitor<S, N, P> {
    reconciler: Reconciler<S, N, P>,
    interval: Duration,
}

impl<S, N, P> PersistenceMonitor<S, N, P>
where
    S: ConstraintStore,
    N: NotifyAdapter,
    P: ScopeAdapter,
{
    pub fn new(store: Arc<S>, notify: N, scopes: P, max_attempts: u32, config: &MonitorConfig) -> Self {
        Self {
            reconciler: Reconciler::new(store, notify, scopes, max_attempts),
            interval: config.interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single sweep over every unit holding a blocked consumer
    pub async fn tick(&self) -> Result<ReconcileReport, StepError> {
        let units = self.reconciler.store().occupied_units().await?;
        let mut report = ReconcileReport::default();

        for unit in units
            .iter()
            .filter(|u| u.consumers.iter().any(|c| c.is_blocked()))
        {
            match self.reconciler.reconcile_unit(&unit.key, None).await {
                Ok(unit_report) => report.merge(unit_report),
                Err(e) => tracing::warn!(unit = %unit.key, error = %e, "monitor sweep failed"),
            }
        }

        if !report.is_empty() {
            tracing::info!(
                swept = report.swept,
                promoted = report.promoted.len(),
                "monitor sweep"
            );
        }
        Ok(report)
    }

    /// Sweep every interval until `shutdown` turns true or its sender drops
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::warn!(error = %e, "monitor tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("persistence monitor stopped");
    }
}

/// Snapshot of constraint and consumer counts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestraintStats {
    pub constraints: usize,
    pub occupied_units: usize,
    pub active_consumers: usize,
    pub blocked_consumers: usize,
    pub permits_in_use: u64,
}

impl RestraintStats {
    /// Collect statistics from a constraint store
    pub async fn collect<S: ConstraintStore>(store: &S) -> Result<Self, StepError> {
        let mut stats = RestraintStats {
            constraints: store.constraint_count().await?,
            ..RestraintStats::default()
        };

        for unit in store.occupied_units().await? {
            stats.occupied_units += 1;
            for consumer in &unit.consumers {
                match consumer.state {
                    ConsumerState::Active => {
                        stats.active_consumers += 1;
                        stats.permits_in_use += u64::from(consumer.permits);
                    }
                    ConsumerState::Blocked => stats.blocked_consumers += 1,
                    ConsumerState::Rejected => {}
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
