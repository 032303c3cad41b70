// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-unit reconciliation shared by the observer and the persistence monitor

use crate::error::StepError;
use restraint_adapters::{NotifyAdapter, ScopeAdapter};
use restraint_core::{ConsumerId, Event, LedgerInput, UnitKey, UnitLedger};
use restraint_storage::ConstraintStore;
use std::collections::BTreeSet;
use std::sync::Arc;

/// What a reconciliation changed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub swept: usize,
    pub promoted: Vec<ConsumerId>,
}

impl ReconcileReport {
    pub fn merge(&mut self, other: ReconcileReport) {
        self.swept += other.swept;
        self.promoted.extend(other.promoted);
    }

    pub fn is_empty(&self) -> bool {
        self.swept == 0 && self.promoted.is_empty()
    }
}

pub(crate) struct Reconciler<S, N, P> {
    store: Arc<S>,
    notify: N,
    scopes: P,
    max_attempts: u32,
}

impl<S, N: Clone, P: Clone> Clone for Reconciler<S, N, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notify: self.notify.clone(),
            scopes: self.scopes.clone(),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S, N, P> Reconciler<S, N, P>
where
    S: ConstraintStore,
    N: NotifyAdapter,
    P: ScopeAdapter,
{
    pub(crate) fn new(store: Arc<S>, notify: N, scopes: P, max_attempts: u32) -> Self {
        Self {
            store,
            notify,
            scopes,
            max_attempts: max_attempts.max(1),
        }
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Sweep finished holders from a unit and promote waiters.
    ///
    /// `ending` is swept unconditionally; other holders are swept when the
    /// scope adapter reports their release entity finished.
    pub(crate) async fn reconcile_unit(
        &self,
        key: &UnitKey,
        ending: Option<&str>,
    ) -> Result<ReconcileReport, StepError> {
        for attempt in 1..=self.max_attempts {
            let snapshot = self.store.load_unit(key).await?;
            if snapshot.consumers.is_empty() {
                return Ok(ReconcileReport::default());
            }
            let Some(constraint) = self.store.constraint(&key.constraint_id).await? else {
                tracing::warn!(unit = %key, "consumers reference an unknown constraint");
                return Ok(ReconcileReport::default());
            };

            let finished = self.finished_entities(&snapshot.consumers, ending).await;
            let ledger = UnitLedger::new(key.clone(), constraint.capacity, snapshot.consumers);
            let (next, events) = ledger.transition(LedgerInput::Sweep { finished })?;
            if events.is_empty() {
                return Ok(ReconcileReport::default());
            }

            match self
                .store
                .commit_unit(key, snapshot.version, next.consumers)
                .await
            {
                Ok(version) => {
                    let report = report_for(&events);
                    tracing::info!(
                        unit = %key,
                        version,
                        swept = report.swept,
                        promoted = report.promoted.len(),
                        "unit reconciled"
                    );
                    self.publish(events).await;
                    return Ok(report);
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(unit = %key, attempt, "reconcile conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StepError::Contended {
            key: key.clone(),
            attempts: self.max_attempts,
        })
    }

    async fn finished_entities(
        &self,
        consumers: &[restraint_core::Consumer],
        ending: Option<&str>,
    ) -> BTreeSet<String> {
        let mut finished = BTreeSet::new();
        if let Some(ending) = ending {
            finished.insert(ending.to_string());
        }

        let holders: BTreeSet<&str> = consumers.iter().map(|c| c.release_entity_id()).collect();
        for entity in holders {
            if finished.contains(entity) {
                continue;
            }
            match self.scopes.is_finished(entity).await {
                Ok(true) => {
                    finished.insert(entity.to_string());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(release_entity_id = entity, error = %e, "scope lookup failed, keeping holder");
                }
            }
        }
        finished
    }

    pub(crate) async fn publish(&self, events: Vec<Event>) {
        publish(&self.notify, events).await;
    }
}

/// Deliver events, logging failed deliveries
pub(crate) async fn publish<N: NotifyAdapter>(notify: &N, events: Vec<Event>) {
    for event in events {
        let name = event.name();
        if let Err(e) = notify.notify(event).await {
            tracing::warn!(event = name, error = %e, "event delivery failed");
        }
    }
}

fn report_for(events: &[Event]) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for event in events {
        match event {
            Event::ConsumerSwept { .. } => report.swept += 1,
            Event::ConsumerUnblocked { consumer_id, .. } => report.promoted.push(consumer_id.clone()),
            _ => {}
        }
    }
    report
}
