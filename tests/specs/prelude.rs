//! Shared harness for restraint specs

#![allow(dead_code)]

pub use restraint_adapters::{FakeNotifyAdapter, FakeScopeAdapter, TemplateRenderer};
pub use restraint_core::{
    AcquireMode, ConstraintError, Consumer, ConsumerId, ConsumerState, ExecutionContext,
    FakeClock, HoldingScope, SequentialIdGen, UnitKey,
};
pub use restraint_engine::{
    ExecutionMode, QueueStep, ReconciliationObserver, RegistrationConfig, ResumeResult,
    StepError, StepOutcome, StepParameters, Suspension,
};
pub use restraint_storage::{ConstraintStore, MemoryStore, UnitSnapshot, WalStore};
pub use std::sync::Arc;

pub const ACCOUNT: &str = "acct";
pub const CONSTRAINT: &str = "deploy-slots";

pub type Step<S> = QueueStep<S, FakeNotifyAdapter, TemplateRenderer, FakeClock, SequentialIdGen>;

/// A queue step and reconciliation observer over one store
pub struct Harness<S: ConstraintStore> {
    pub store: Arc<S>,
    pub notify: FakeNotifyAdapter,
    pub scopes: FakeScopeAdapter,
    pub step: Step<S>,
    pub observer: ReconciliationObserver<S, FakeNotifyAdapter, FakeScopeAdapter>,
}

impl Harness<MemoryStore> {
    pub async fn with_capacity(capacity: u32) -> Self {
        Self::over(Arc::new(MemoryStore::new()), capacity).await
    }
}

impl<S: ConstraintStore> Harness<S> {
    pub async fn over(store: Arc<S>, capacity: u32) -> Self {
        let notify = FakeNotifyAdapter::new();
        let scopes = FakeScopeAdapter::new();
        let step = QueueStep::new(
            Arc::clone(&store),
            notify.clone(),
            TemplateRenderer::new(),
            FakeClock::new(),
            SequentialIdGen::new("consumer"),
            RegistrationConfig::default().with_max_attempts(50),
        );
        step.registry()
            .ensure_constraint(ACCOUNT, CONSTRAINT, capacity)
            .await
            .unwrap();
        let observer =
            ReconciliationObserver::new(Arc::clone(&store), notify.clone(), scopes.clone(), 50);
        Self {
            store,
            notify,
            scopes,
            step,
            observer,
        }
    }

    /// Consumers of the `prod` unit
    pub async fn unit(&self) -> UnitSnapshot {
        let constraint = self
            .store
            .constraint_by_name(ACCOUNT, CONSTRAINT)
            .await
            .unwrap()
            .unwrap();
        self.store
            .load_unit(&UnitKey::new(constraint.id, "prod"))
            .await
            .unwrap()
    }

    pub async fn state_of(&self, consumer_id: &ConsumerId) -> Option<ConsumerState> {
        self.unit().await.consumer(consumer_id).map(|c| c.state)
    }

    /// Run the step the way the workflow engine does: facilitate, then take
    /// the chosen path
    pub async fn acquire(
        &self,
        params: &StepParameters,
        ctx: &ExecutionContext,
    ) -> Result<Acquired, StepError> {
        match self.step.facilitate(params, ctx).await? {
            ExecutionMode::Sync => Ok(Acquired::Done(self.step.execute_sync(params, ctx).await?)),
            ExecutionMode::Async => Ok(Acquired::Waiting(
                self.step.execute_async(params, ctx).await?,
            )),
        }
    }

    pub async fn holders(&self, plan: &str) -> Vec<Consumer> {
        self.store.consumers_for_release_entity(plan).await.unwrap()
    }
}

#[derive(Debug)]
pub enum Acquired {
    Done(StepOutcome),
    Waiting(Suspension),
}

impl Acquired {
    pub fn outcome(self) -> StepOutcome {
        match self {
            Acquired::Done(outcome) => outcome,
            Acquired::Waiting(s) => panic!("expected permits, got suspension {s:?}"),
        }
    }

    pub fn suspension(self) -> Suspension {
        match self {
            Acquired::Waiting(suspension) => suspension,
            Acquired::Done(o) => panic!("expected suspension, got outcome {o:?}"),
        }
    }
}

pub fn ctx(plan: &str) -> ExecutionContext {
    ExecutionContext::new(ACCOUNT, plan, format!("{plan}-node")).with_variable("env", "prod")
}

pub fn request(permits: u32) -> StepParameters {
    StepParameters::resource_constraint(CONSTRAINT, "{env}", permits, "deploy")
}
