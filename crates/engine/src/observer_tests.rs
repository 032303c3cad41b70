// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::RegistrationConfig;
use crate::request::StepParameters;
use crate::step::{QueueStep, ResumeResult};
use restraint_adapters::{FakeNotifyAdapter, FakeScopeAdapter, TemplateRenderer};
use restraint_core::{ConsumerState, ExecutionContext, FakeClock, SequentialIdGen};
use restraint_storage::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    notify: FakeNotifyAdapter,
    scopes: FakeScopeAdapter,
    step: QueueStep<MemoryStore, FakeNotifyAdapter, TemplateRenderer, FakeClock, SequentialIdGen>,
    observer: ReconciliationObserver<MemoryStore, FakeNotifyAdapter, FakeScopeAdapter>,
}

async fn fixture(capacity: u32) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let notify = FakeNotifyAdapter::new();
    let scopes = FakeScopeAdapter::new();
    let step = QueueStep::new(
        Arc::clone(&store),
        notify.clone(),
        TemplateRenderer::new(),
        FakeClock::new(),
        SequentialIdGen::new("c"),
        RegistrationConfig::default(),
    );
    step.registry()
        .ensure_constraint("acct", "deploy", capacity)
        .await
        .unwrap();
    let observer = ReconciliationObserver::new(Arc::clone(&store), notify.clone(), scopes.clone(), 3);
    Fixture {
        store,
        notify,
        scopes,
        step,
        observer,
    }
}

fn ctx(plan: &str) -> ExecutionContext {
    ExecutionContext::new("acct", plan, "node")
}

fn params(unit: &str, permits: u32) -> StepParameters {
    StepParameters::resource_constraint("deploy", unit, permits, "deploy-step")
}

#[tokio::test]
async fn reconcile_after_abort_promotes_waiter() {
    let f = fixture(2).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 2), &ctx("plan-2")).await.unwrap();
    let holder = f.store.consumers_for_release_entity("plan-1").await.unwrap()[0].clone();

    f.step.handle_abort(&holder.unit_key(), &holder.id).await.unwrap();
    let report = f.observer.process_unit(&waiting.key).await.unwrap();

    assert_eq!(report.promoted, vec![waiting.consumer_id.clone()]);
    assert_eq!(f.notify.unblocked(), vec![waiting.consumer_id.clone()]);
    match f.step.handle_resume(&waiting).await.unwrap() {
        ResumeResult::Ready(outcome) => assert_eq!(outcome.permits_used, 2),
        ResumeResult::Waiting => panic!("consumer should be active"),
    }
}

#[tokio::test]
async fn scope_end_sweeps_every_unit_of_the_scope() {
    let f = fixture(1).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    f.step.execute_sync(&params("stage", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 1), &ctx("plan-2")).await.unwrap();

    let report = f.observer.on_scope_ended("plan-1").await.unwrap();

    assert_eq!(report.swept, 2);
    assert_eq!(report.promoted, vec![waiting.consumer_id]);
    assert!(f
        .store
        .consumers_for_release_entity("plan-1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn promotion_is_fifo_without_jumping_ahead() {
    let f = fixture(2).await;
    f.step.execute_sync(&params("prod", 2), &ctx("plan-1")).await.unwrap();
    let second = f.step.execute_async(&params("prod", 2), &ctx("plan-2")).await.unwrap();
    let third = f.step.execute_async(&params("prod", 1), &ctx("plan-3")).await.unwrap();

    let report = f.observer.on_scope_ended("plan-1").await.unwrap();
    assert_eq!(report.promoted, vec![second.consumer_id.clone()]);
    let snapshot = f.store.load_unit(&third.key).await.unwrap();
    assert_eq!(
        snapshot.consumer(&third.consumer_id).unwrap().state,
        ConsumerState::Blocked
    );

    let report = f.observer.on_scope_ended("plan-2").await.unwrap();
    assert_eq!(report.promoted, vec![third.consumer_id]);
}

#[tokio::test]
async fn finished_holders_reported_by_scope_adapter_are_swept() {
    let f = fixture(1).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 1), &ctx("plan-2")).await.unwrap();
    f.scopes.finish("plan-1");

    let report = f.observer.process_unit(&waiting.key).await.unwrap();

    assert_eq!(report.swept, 1);
    assert_eq!(report.promoted, vec![waiting.consumer_id]);
}

#[tokio::test]
async fn failed_scope_lookup_keeps_holder() {
    let f = fixture(1).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 1), &ctx("plan-2")).await.unwrap();
    f.scopes.fail_lookup("plan-1");

    let report = f.observer.process_unit(&waiting.key).await.unwrap();

    assert!(report.is_empty());
    assert_eq!(f.store.load_unit(&waiting.key).await.unwrap().consumers.len(), 2);
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let f = fixture(1).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 1), &ctx("plan-2")).await.unwrap();
    f.observer.on_scope_ended("plan-1").await.unwrap();
    let version = f.store.load_unit(&waiting.key).await.unwrap().version;

    let report = f.observer.process_unit(&waiting.key).await.unwrap();

    assert!(report.is_empty());
    assert_eq!(f.store.load_unit(&waiting.key).await.unwrap().version, version);
}

#[tokio::test]
async fn spawned_observer_handles_scope_end() {
    let f = fixture(1).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 1), &ctx("plan-2")).await.unwrap();

    let (handle, task) = f.observer.spawn(4);
    assert!(handle.scope_ended("plan-1"));
    drop(handle);
    task.await.unwrap();

    assert_eq!(f.notify.unblocked(), vec![waiting.consumer_id]);
}

#[tokio::test]
async fn routed_abort_triggers_reconcile() {
    let f = fixture(1).await;
    f.step.execute_sync(&params("prod", 1), &ctx("plan-1")).await.unwrap();
    let waiting = f.step.execute_async(&params("prod", 1), &ctx("plan-2")).await.unwrap();
    let holder = f.store.consumers_for_release_entity("plan-1").await.unwrap()[0].clone();

    let (handle, task) = f.observer.spawn(4);
    let routed = QueueStep::new(
        Arc::clone(&f.store),
        handle.route(f.notify.clone()),
        TemplateRenderer::new(),
        FakeClock::new(),
        SequentialIdGen::new("r"),
        RegistrationConfig::default(),
    );
    routed.handle_abort(&holder.unit_key(), &holder.id).await.unwrap();
    drop(routed);
    drop(handle);
    task.await.unwrap();

    assert_eq!(f.notify.unblocked(), vec![waiting.consumer_id]);
}

#[tokio::test]
async fn handle_reports_dropped_requests_when_stopped() {
    let f = fixture(1).await;
    let (handle, task) = f.observer.spawn(1);
    task.abort();
    let _ = task.await;

    assert!(!handle.scope_ended("plan-1"));
}
