//! FIFO specs
//!
//! Waiters are admitted in registration order; a small request never
//! overtakes a larger one that registered first.

use crate::prelude::*;

#[tokio::test]
async fn small_request_queues_behind_large_waiter() {
    let h = Harness::with_capacity(3).await;
    h.acquire(&request(2), &ctx("plan-1")).await.unwrap().outcome();
    let large = h.acquire(&request(3), &ctx("plan-2")).await.unwrap().suspension();

    // One permit is free, but plan-2 registered first
    let small = h.acquire(&request(1), &ctx("plan-3")).await.unwrap().suspension();

    h.observer.on_scope_ended("plan-1").await.unwrap();
    assert_eq!(h.state_of(&large.consumer_id).await, Some(ConsumerState::Active));
    assert_eq!(h.state_of(&small.consumer_id).await, Some(ConsumerState::Blocked));

    h.observer.on_scope_ended("plan-2").await.unwrap();
    assert_eq!(h.state_of(&small.consumer_id).await, Some(ConsumerState::Active));
    assert_eq!(
        h.notify.unblocked(),
        vec![large.consumer_id, small.consumer_id]
    );
}

#[tokio::test]
async fn orders_increase_with_registration() {
    let h = Harness::with_capacity(1).await;
    h.acquire(&request(1), &ctx("plan-1")).await.unwrap().outcome();
    for plan in ["plan-2", "plan-3", "plan-4"] {
        h.acquire(&request(1), &ctx(plan)).await.unwrap().suspension();
    }

    let orders: Vec<u64> = h.unit().await.consumers.iter().map(|c| c.order).collect();
    let mut sorted = orders.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(orders, sorted);
}
