//! Durability specs
//!
//! Constraints, consumers and order counters survive a restart of a
//! WAL-backed store.

use crate::prelude::*;

#[tokio::test]
async fn waiting_consumer_survives_restart_and_is_promoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restraint.wal");

    let waiting = {
        let h = Harness::over(Arc::new(WalStore::open(&path).unwrap()), 1).await;
        h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
        h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension()
    };

    let h = Harness::over(Arc::new(WalStore::open(&path).unwrap()), 1).await;
    assert_eq!(h.store.constraint_count().await.unwrap(), 1);
    assert_eq!(
        h.state_of(&waiting.consumer_id).await,
        Some(ConsumerState::Blocked)
    );

    h.observer.on_scope_ended("plan-1").await.unwrap();
    assert!(matches!(
        h.step.handle_resume(&waiting).await.unwrap(),
        ResumeResult::Ready(_)
    ));

    // Orders keep increasing across the restart
    let next = h.acquire(&request(1), &ctx("plan-3")).await.unwrap().suspension();
    let order_of = |id: &ConsumerId, unit: &UnitSnapshot| unit.consumer(id).map(|c| c.order);
    let unit = h.unit().await;
    assert!(order_of(&next.consumer_id, &unit) > order_of(&waiting.consumer_id, &unit));
}
