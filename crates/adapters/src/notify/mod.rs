// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of restraint events to the workflow engine
//!
//! The engine resumes a suspended step when it sees a
//! [`Event::ConsumerUnblocked`] for that step's consumer.

mod channel;
mod noop;

pub use channel::ChannelNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifyAdapter;

use async_trait::async_trait;
use restraint_core::Event;
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("event receiver closed")]
    Closed,
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Adapter receiving every event the restraint engine publishes
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    async fn notify(&self, event: Event) -> Result<(), NotifyError>;
}
