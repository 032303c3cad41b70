//! Abort specs
//!
//! Aborting a step removes its consumer entirely, and aborting twice is the
//! same as aborting once.

use crate::prelude::*;

#[tokio::test]
async fn abort_releases_all_permits_of_the_consumer() {
    let h = Harness::with_capacity(2).await;
    h.acquire(&request(2), &ctx("plan-1")).await.unwrap().outcome();
    let held = h.holders("plan-1").await;
    assert_eq!(held.len(), 1);

    h.step.handle_abort(&held[0].unit_key(), &held[0].id).await.unwrap();

    assert!(h.holders("plan-1").await.is_empty());
    // Nothing is held any more, so ENSURE asks for the full amount again
    let again = h.acquire(&request(2), &ctx("plan-1")).await.unwrap().outcome();
    assert_eq!(again.already_acquired_permits, 0);
    assert_eq!(again.permits_used, 2);
}

#[tokio::test]
async fn abort_of_waiting_step_leaves_holders_alone() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let waiting = h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension();

    h.step
        .handle_abort(&waiting.key, &waiting.consumer_id)
        .await
        .unwrap();

    assert_eq!(h.unit().await.consumers.len(), 1);
    assert_eq!(h.holders("plan-1").await.len(), 1);
}

#[tokio::test]
async fn abort_twice_is_a_no_op() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let waiting = h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension();

    h.step
        .handle_abort(&waiting.key, &waiting.consumer_id)
        .await
        .unwrap();
    let after_first = h.unit().await;
    h.step
        .handle_abort(&waiting.key, &waiting.consumer_id)
        .await
        .unwrap();

    assert_eq!(h.unit().await, after_first);
    let released = h
        .notify
        .names()
        .into_iter()
        .filter(|name| *name == "consumer:released")
        .count();
    assert_eq!(released, 1);
}

#[tokio::test]
async fn abort_of_unknown_consumer_succeeds() {
    let h = Harness::with_capacity(1).await;
    let constraint = h
        .store
        .constraint_by_name(ACCOUNT, CONSTRAINT)
        .await
        .unwrap()
        .unwrap();

    h.step
        .handle_abort(
            &UnitKey::new(constraint.id, "prod"),
            &ConsumerId::new("never-registered"),
        )
        .await
        .unwrap();

    assert!(h.notify.events().is_empty());
}
