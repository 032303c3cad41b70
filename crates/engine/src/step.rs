// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue step: registration, the sync and async paths, resume and abort
//!
//! Each handler is a read-compute-write on one unit: load the snapshot,
//! run a [`UnitLedger`] transition, and commit with the version that was
//! read. A conflicting writer forces a retry from a fresh load.

use crate::config::RegistrationConfig;
use crate::error::StepError;
use crate::facilitator::{AdmissionFacilitator, ExecutionMode};
use crate::reconcile;
use crate::registry::ConstraintRegistry;
use crate::request::{StepKind, StepParameters};
use restraint_adapters::{ExpressionRenderer, NotifyAdapter};
use restraint_core::{
    evaluator, Clock, ConstraintError, Consumer, ConsumerContext, ConsumerId, ConsumerState,
    ExecutionContext, IdGen, LedgerInput, ResourceConstraint, UnitKey, UnitLedger,
};
use restraint_storage::ConstraintStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result handed back to the workflow engine once permits are held
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub resource_name: String,
    pub capacity: u32,
    pub resource_unit: String,
    /// Permits this step acquired
    pub permits_used: u32,
    /// Permits the holding scope held before this step
    pub already_acquired_permits: u32,
}

/// Token returned by the async path; the engine keeps it until resume or abort
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension {
    pub consumer_id: ConsumerId,
    pub key: UnitKey,
    pub permits: u32,
    pub already_acquired_permits: u32,
}

/// What a resume invocation found
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResumeResult {
    /// The consumer holds its permits; the step succeeds
    Ready(StepOutcome),
    /// Still waiting; the invocation was redundant
    Waiting,
}

pub struct QueueStep<S, N, R, C, I> {
    store: Arc<S>,
    notify: N,
    clock: C,
    ids: I,
    registry: ConstraintRegistry<S, I>,
    facilitator: AdmissionFacilitator<S, R>,
    config: RegistrationConfig,
}

impl<S, N, R, C, I> QueueStep<S, N, R, C, I>
where
    S: ConstraintStore,
    N: NotifyAdapter,
    R: ExpressionRenderer,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        store: Arc<S>,
        notify: N,
        renderer: R,
        clock: C,
        ids: I,
        config: RegistrationConfig,
    ) -> Self {
        Self {
            registry: ConstraintRegistry::new(Arc::clone(&store), ids.clone()),
            facilitator: AdmissionFacilitator::new(Arc::clone(&store), renderer),
            store,
            notify,
            clock,
            ids,
            config,
        }
    }

    pub fn registry(&self) -> &ConstraintRegistry<S, I> {
        &self.registry
    }

    /// Decide between the sync and async paths without writing anything
    pub async fn facilitate(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionMode, StepError> {
        self.facilitator.facilitate(params, ctx).await
    }

    /// Acquire permits that are expected to be available right away
    pub async fn execute_sync(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<StepOutcome, StepError> {
        let registration = self.register(params, ctx).await?;

        match &registration.consumer {
            None => Ok(registration.outcome(0)),
            Some(consumer) if consumer.is_active() => Ok(registration.outcome(consumer.permits)),
            Some(consumer) => {
                self.rollback(consumer).await;
                Err(StepError::invalid_request(format!(
                    "expected {} permits on {} to be available, but the request was blocked",
                    consumer.permits, registration.key
                )))
            }
        }
    }

    /// Register a request that is expected to wait and return its suspension token
    pub async fn execute_async(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<Suspension, StepError> {
        let registration = self.register(params, ctx).await?;

        match registration.consumer {
            None => Err(StepError::invalid_request(format!(
                "expected to wait on {}, but the permits are already held",
                registration.key
            ))),
            Some(consumer) if consumer.is_active() => {
                self.rollback(&consumer).await;
                Err(StepError::invalid_request(format!(
                    "expected to wait on {}, but the permits were available",
                    registration.key
                )))
            }
            Some(consumer) => {
                tracing::info!(
                    consumer_id = %consumer.id,
                    unit = %registration.key,
                    order = consumer.order,
                    "step suspended"
                );
                Ok(Suspension {
                    consumer_id: consumer.id,
                    key: registration.key,
                    permits: consumer.permits,
                    already_acquired_permits: registration.already_acquired,
                })
            }
        }
    }

    /// Check a suspended consumer after an unblocked notification
    pub async fn handle_resume(&self, suspension: &Suspension) -> Result<ResumeResult, StepError> {
        let constraint = self
            .store
            .constraint(&suspension.key.constraint_id)
            .await?
            .ok_or_else(|| {
                StepError::invalid_request(format!(
                    "resource constraint {} no longer exists",
                    suspension.key.constraint_id
                ))
            })?;
        let snapshot = self.store.load_unit(&suspension.key).await?;
        let consumer = snapshot.consumer(&suspension.consumer_id).ok_or_else(|| {
            StepError::invalid_request(format!(
                "consumer {} on {} no longer exists",
                suspension.consumer_id, suspension.key
            ))
        })?;

        match consumer.state {
            ConsumerState::Active => Ok(ResumeResult::Ready(StepOutcome {
                resource_name: constraint.name,
                capacity: constraint.capacity,
                resource_unit: suspension.key.unit.clone(),
                permits_used: consumer.permits,
                already_acquired_permits: suspension.already_acquired_permits,
            })),
            ConsumerState::Blocked => {
                tracing::debug!(consumer_id = %consumer.id, "resume while still blocked");
                Ok(ResumeResult::Waiting)
            }
            ConsumerState::Rejected => Err(StepError::invalid_request(format!(
                "consumer {} was rejected",
                consumer.id
            ))),
        }
    }

    /// Remove a consumer. Removing one that is already gone is a no-op.
    pub async fn handle_abort(
        &self,
        key: &UnitKey,
        consumer_id: &ConsumerId,
    ) -> Result<(), StepError> {
        for attempt in 1..=self.max_attempts() {
            let snapshot = self.store.load_unit(key).await?;
            if snapshot.consumer(consumer_id).is_none() {
                tracing::debug!(%consumer_id, unit = %key, "abort of absent consumer");
                return Ok(());
            }
            let capacity = self.capacity_of(key).await?;
            let ledger = UnitLedger::new(key.clone(), capacity, snapshot.consumers);
            let (next, events) = ledger.transition(LedgerInput::Release {
                consumer_id: consumer_id.clone(),
            })?;

            match self
                .store
                .commit_unit(key, snapshot.version, next.consumers)
                .await
            {
                Ok(_) => {
                    tracing::info!(%consumer_id, unit = %key, "consumer released");
                    reconcile::publish(&self.notify, events).await;
                    return Ok(());
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(%consumer_id, attempt, "release conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StepError::Contended {
            key: key.clone(),
            attempts: self.max_attempts(),
        })
    }

    /// Register a consumer for whatever the holding scope still lacks.
    ///
    /// Returns no consumer when the scope already holds enough. Requests
    /// that can never be admitted fail before an order is reserved.
    async fn register(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<Registration, StepError> {
        let unit = self.facilitator.render_unit(params, ctx)?;
        let release_entity_id = params.holding_scope.release_entity_id(ctx)?;
        if params.permits == 0 {
            return Err(ConstraintError::InvalidPermits { permits: 0 }.into());
        }
        let constraint = self.resolve_constraint(params, ctx).await?;
        // Held permits never make an oversized request admissible
        evaluator::validate_permits(constraint.capacity, params.permits)?;
        let key = UnitKey::new(constraint.id.clone(), unit);

        for attempt in 1..=self.max_attempts() {
            let snapshot = self.store.load_unit(&key).await?;
            let ledger = UnitLedger::new(key.clone(), constraint.capacity, snapshot.consumers);
            let held = ledger.acquired_by(&release_entity_id);
            let effective = params.acquire_mode.effective_permits(params.permits, held);
            if effective == 0 {
                tracing::debug!(unit = %key, %release_entity_id, held, "permits already held");
                return Ok(Registration {
                    constraint,
                    key,
                    already_acquired: held,
                    consumer: None,
                });
            }
            ledger.evaluate(effective)?;

            let order = self.store.reserve_order(&constraint.id).await?;
            let consumer = Consumer {
                id: self.ids.next_consumer_id(),
                constraint_id: constraint.id.clone(),
                unit: key.unit.clone(),
                permits: effective,
                state: ConsumerState::Blocked,
                order,
                claimant_id: params.claimant_id.clone(),
                context: ConsumerContext {
                    release_entity_type: params.holding_scope,
                    release_entity_id: release_entity_id.clone(),
                    created_at: self.clock.now(),
                },
            };
            let consumer_id = consumer.id.clone();
            let (next, events) = ledger.transition(LedgerInput::Register { consumer })?;
            let Some(registered) = next.get(&consumer_id).cloned() else {
                return Err(StepError::invalid_request(format!(
                    "consumer {consumer_id} missing after registration"
                )));
            };

            match self
                .store
                .commit_unit(&key, snapshot.version, next.consumers)
                .await
            {
                Ok(version) => {
                    tracing::info!(
                        consumer_id = %registered.id,
                        unit = %key,
                        permits = registered.permits,
                        state = %registered.state,
                        order = registered.order,
                        version,
                        "consumer registered"
                    );
                    reconcile::publish(&self.notify, events).await;
                    return Ok(Registration {
                        constraint,
                        key,
                        already_acquired: held,
                        consumer: Some(registered),
                    });
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(unit = %key, attempt, "registration conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(unit = %key, attempts = self.max_attempts(), "registration gave up");
        Err(ConstraintError::UnableToRegisterConsumer {
            unit: key.to_string(),
            attempts: self.max_attempts(),
        }
        .into())
    }

    /// Undo a registration whose state contradicted the chosen path
    async fn rollback(&self, consumer: &Consumer) {
        if let Err(e) = self.handle_abort(&consumer.unit_key(), &consumer.id).await {
            tracing::warn!(consumer_id = %consumer.id, error = %e, "rollback failed");
        }
    }

    async fn resolve_constraint(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<ResourceConstraint, StepError> {
        match params.kind {
            StepKind::Queue => self.registry.ensure_queue_constraint(&ctx.account_id).await,
            StepKind::ResourceConstraint => {
                let name = params.constraint_name();
                self.registry
                    .by_name(&ctx.account_id, name)
                    .await?
                    .ok_or_else(|| {
                        StepError::invalid_request(format!(
                            "unknown resource constraint {name} in account {}",
                            ctx.account_id
                        ))
                    })
            }
        }
    }

    async fn capacity_of(&self, key: &UnitKey) -> Result<u32, StepError> {
        let constraint = self.store.constraint(&key.constraint_id).await?;
        Ok(constraint.map(|c| c.capacity).unwrap_or(0))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }
}

struct Registration {
    constraint: ResourceConstraint,
    key: UnitKey,
    already_acquired: u32,
    consumer: Option<Consumer>,
}

impl Registration {
    fn outcome(&self, permits_used: u32) -> StepOutcome {
        StepOutcome {
            resource_name: self.constraint.name.clone(),
            capacity: self.constraint.capacity,
            resource_unit: self.key.unit.clone(),
            permits_used,
            already_acquired_permits: self.already_acquired,
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
