// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission facilitator: read-only choice between the sync and async paths
//!
//! The prediction is made against committed state and can be stale by the
//! time the step registers; the step handlers surface such mismatches.

use crate::error::StepError;
use crate::request::{StepKind, StepParameters};
use restraint_adapters::ExpressionRenderer;
use restraint_core::{
    evaluator, template, ConsumerState, ExecutionContext, ResourceConstraint, UnitKey, UnitLedger,
    QUEUE_CONSTRAINT_CAPACITY,
};
use restraint_storage::ConstraintStore;
use std::sync::Arc;

/// How the engine should run the step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Permits are available (or already held); run and complete inline
    Sync,
    /// The request must wait; suspend after registering
    Async,
}

/// Where a request lands and what it would need
#[derive(Clone, Debug)]
pub struct Assessment {
    pub constraint: ResourceConstraint,
    pub key: UnitKey,
    pub release_entity_id: String,
    /// Permits the release entity already holds on this unit
    pub already_acquired: u32,
    /// Permits still to acquire; zero means nothing to register
    pub effective: u32,
    /// State a new consumer would get; `None` when nothing is needed
    pub predicted: Option<ConsumerState>,
}

pub struct AdmissionFacilitator<S, R> {
    store: Arc<S>,
    renderer: R,
}

impl<S, R: Clone> Clone for AdmissionFacilitator<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            renderer: self.renderer.clone(),
        }
    }
}

impl<S: ConstraintStore, R: ExpressionRenderer> AdmissionFacilitator<S, R> {
    pub fn new(store: Arc<S>, renderer: R) -> Self {
        Self { store, renderer }
    }

    /// Decide the execution mode for a step. Never writes.
    pub async fn facilitate(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionMode, StepError> {
        let unit = self.render_unit(params, ctx)?;
        let constraint = match self.lookup(params, ctx).await? {
            Some(constraint) => constraint,
            None => {
                // Queue constraint not created yet, so nobody holds it
                evaluator::validate_permits(QUEUE_CONSTRAINT_CAPACITY, params.permits)?;
                params.holding_scope.release_entity_id(ctx)?;
                return Ok(ExecutionMode::Sync);
            }
        };

        let assessment = self.assess(constraint, unit, params, ctx).await?;
        let mode = match assessment.predicted {
            None | Some(ConsumerState::Active) => ExecutionMode::Sync,
            Some(_) => ExecutionMode::Async,
        };
        tracing::debug!(
            constraint = %assessment.constraint.name,
            unit = %assessment.key.unit,
            effective = assessment.effective,
            ?mode,
            "admission facilitated"
        );
        Ok(mode)
    }

    /// Render the unit expression and reject anything left unresolved
    pub fn render_unit(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<String, StepError> {
        let unit = self.renderer.render(&params.resource_unit, ctx);
        template::ensure_resolved(&unit)?;
        Ok(unit)
    }

    /// Evaluate a request against the committed state of its unit
    pub async fn assess(
        &self,
        constraint: ResourceConstraint,
        unit: String,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<Assessment, StepError> {
        let release_entity_id = params.holding_scope.release_entity_id(ctx)?;
        // Held permits never make an oversized request admissible
        evaluator::validate_permits(constraint.capacity, params.permits)?;

        let key = UnitKey::new(constraint.id.clone(), unit);
        let snapshot = self.store.load_unit(&key).await?;
        let ledger = UnitLedger::new(key.clone(), constraint.capacity, snapshot.consumers);

        let already_acquired = ledger.acquired_by(&release_entity_id);
        let effective = params
            .acquire_mode
            .effective_permits(params.permits, already_acquired);
        let predicted = if effective == 0 {
            None
        } else {
            Some(ledger.evaluate(effective)?)
        };

        Ok(Assessment {
            constraint,
            key,
            release_entity_id,
            already_acquired,
            effective,
            predicted,
        })
    }

    async fn lookup(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<Option<ResourceConstraint>, StepError> {
        let name = params.constraint_name();
        let found = self.store.constraint_by_name(&ctx.account_id, name).await?;
        match (found, params.kind) {
            (Some(constraint), _) => Ok(Some(constraint)),
            (None, StepKind::Queue) => Ok(None),
            (None, StepKind::ResourceConstraint) => Err(StepError::invalid_request(format!(
                "unknown resource constraint {name} in account {}",
                ctx.account_id
            ))),
        }
    }
}

#[cfg(test)]
#[path = "facilitator_tests.rs"]
mod tests;
