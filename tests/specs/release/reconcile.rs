//! Reconciliation specs
//!
//! When a holder goes away, waiters are promoted in order and the workflow
//! engine is told which steps to resume.

use crate::prelude::*;
use restraint_adapters::{ChannelNotifyAdapter, NoOpScopeAdapter};
use restraint_core::Event;
use restraint_engine::{EngineConfig, MonitorConfig, Runtime, RuntimeDeps};
use std::time::Duration;

#[tokio::test]
async fn abort_then_reconcile_promotes_waiter() {
    let h = Harness::with_capacity(2).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let waiting = h.acquire(&request(2), &ctx("plan-2")).await.unwrap().suspension();
    let holder = h.holders("plan-1").await.remove(0);

    h.step.handle_abort(&holder.unit_key(), &holder.id).await.unwrap();
    assert_eq!(
        h.state_of(&waiting.consumer_id).await,
        Some(ConsumerState::Blocked)
    );

    h.observer.process_unit(&waiting.key).await.unwrap();

    assert_eq!(
        h.state_of(&waiting.consumer_id).await,
        Some(ConsumerState::Active)
    );
    assert_eq!(h.notify.unblocked(), vec![waiting.consumer_id.clone()]);
    match h.step.handle_resume(&waiting).await.unwrap() {
        ResumeResult::Ready(outcome) => {
            assert_eq!(outcome.permits_used, 2);
            assert_eq!(outcome.capacity, 2);
        }
        ResumeResult::Waiting => panic!("waiter should have been promoted"),
    }
}

#[tokio::test]
async fn redundant_resume_keeps_waiting() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let waiting = h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension();

    assert_eq!(
        h.step.handle_resume(&waiting).await.unwrap(),
        ResumeResult::Waiting
    );
}

#[tokio::test]
async fn scope_end_releases_and_promotes() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let waiting = h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension();

    let report = h.observer.on_scope_ended("plan-1").await.unwrap();

    assert_eq!(report.swept, 1);
    assert_eq!(report.promoted, vec![waiting.consumer_id.clone()]);
    assert!(h.holders("plan-1").await.is_empty());
    assert!(matches!(
        h.step.handle_resume(&waiting).await.unwrap(),
        ResumeResult::Ready(_)
    ));
}

#[tokio::test]
async fn scope_end_without_holdings_is_harmless() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let before = h.unit().await;

    let report = h.observer.on_scope_ended("plan-unknown").await.unwrap();

    assert!(report.is_empty());
    assert_eq!(h.unit().await, before);
}

#[tokio::test]
async fn abort_then_scope_end_promotes_waiter_through_runtime() {
    let (notify, mut events) = ChannelNotifyAdapter::new(64);
    let store = Arc::new(MemoryStore::new());
    let deps = RuntimeDeps {
        store: Arc::clone(&store),
        notify,
        renderer: TemplateRenderer::new(),
        scopes: NoOpScopeAdapter::new(),
    };
    let config = EngineConfig::default().with_monitor(MonitorConfig::default().with_enabled(false));
    let runtime = Runtime::start(deps, &config, FakeClock::new(), SequentialIdGen::new("c"));
    runtime
        .registry()
        .ensure_constraint(ACCOUNT, CONSTRAINT, 2)
        .await
        .unwrap();
    let step = runtime.step();

    // C1 holds one permit, C2 wants two and waits behind it
    step.execute_sync(&request(1), &ctx("plan-1")).await.unwrap();
    let waiting = step.execute_async(&request(2), &ctx("plan-2")).await.unwrap();
    let holder = store.consumers_for_release_entity("plan-1").await.unwrap()[0].clone();

    step.handle_abort(&holder.unit_key(), &holder.id).await.unwrap();
    assert!(runtime.scope_ended("plan-1"));

    let promoted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Some(Event::ConsumerUnblocked { consumer_id, .. }) => break consumer_id,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(promoted, waiting.consumer_id);
    match step.handle_resume(&waiting).await.unwrap() {
        ResumeResult::Ready(outcome) => assert_eq!(outcome.permits_used, 2),
        ResumeResult::Waiting => panic!("waiter should have been promoted"),
    }
    runtime.shutdown().await;
}
