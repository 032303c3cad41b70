//! ENSURE / ACCUMULATE specs
//!
//! ENSURE tops a holding scope up to the requested permits; repeating the
//! request is free. ACCUMULATE always asks for the full amount.

use crate::prelude::*;

#[tokio::test]
async fn repeated_ensure_is_idempotent() {
    let h = Harness::with_capacity(2).await;

    let first = h.acquire(&request(2), &ctx("plan-1")).await.unwrap().outcome();
    let second = h.acquire(&request(2), &ctx("plan-1")).await.unwrap().outcome();

    assert_eq!(first.permits_used, 2);
    assert_eq!(second.permits_used, 0);
    assert_eq!(second.already_acquired_permits, 2);
    assert_eq!(h.holders("plan-1").await.len(), 1);
}

#[tokio::test]
async fn waiting_permits_are_not_held() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let first = h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension();

    // plan-2 holds nothing yet, so a repeat must wait too
    let repeat = h.acquire(&request(1), &ctx("plan-2")).await.unwrap().suspension();

    assert_eq!(repeat.already_acquired_permits, 0);
    assert_eq!(repeat.permits, 1);
    assert_eq!(h.state_of(&first.consumer_id).await, Some(ConsumerState::Blocked));
    assert_eq!(h.state_of(&repeat.consumer_id).await, Some(ConsumerState::Blocked));
}

#[tokio::test]
async fn held_permits_do_not_admit_more_than_capacity() {
    let h = Harness::with_capacity(2).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let before = h.unit().await;

    let err = h.acquire(&request(3), &ctx("plan-1")).await.unwrap_err();

    assert!(matches!(
        err,
        StepError::Constraint(ConstraintError::PermanentlyBlockedConsumer {
            permits: 3,
            capacity: 2
        })
    ));
    assert_eq!(h.unit().await, before);
    // Later requests are not stuck behind it
    h.acquire(&request(1), &ctx("plan-2")).await.unwrap().outcome();
}

#[tokio::test]
async fn accumulate_stacks_requests() {
    let h = Harness::with_capacity(2).await;
    let accumulate = request(1).with_acquire_mode(AcquireMode::Accumulate);

    h.acquire(&accumulate, &ctx("plan-1")).await.unwrap().outcome();
    h.acquire(&accumulate, &ctx("plan-1")).await.unwrap().outcome();
    let third = h.acquire(&accumulate, &ctx("plan-1")).await.unwrap().suspension();

    assert_eq!(h.holders("plan-1").await.len(), 3);
    assert_eq!(
        h.state_of(&third.consumer_id).await,
        Some(ConsumerState::Blocked)
    );
}

#[tokio::test]
async fn stages_hold_separately_from_their_plan() {
    let h = Harness::with_capacity(2).await;
    let staged = request(1).with_holding_scope(HoldingScope::Stage);

    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    let stage = h
        .acquire(&staged, &ctx("plan-1").with_stage("build"))
        .await
        .unwrap()
        .outcome();

    assert_eq!(stage.already_acquired_permits, 0);
    assert_eq!(stage.permits_used, 1);
    assert_eq!(h.holders("plan-1|build").await.len(), 1);
}
