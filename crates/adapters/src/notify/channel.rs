// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel-backed notification adapter

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use restraint_core::Event;
use tokio::sync::mpsc;

/// Forwards events into a bounded tokio channel read by the engine's event loop
#[derive(Clone, Debug)]
pub struct ChannelNotifyAdapter {
    tx: mpsc::Sender<Event>,
}

impl ChannelNotifyAdapter {
    /// Create the adapter and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl NotifyAdapter for ChannelNotifyAdapter {
    async fn notify(&self, event: Event) -> Result<(), NotifyError> {
        self.tx.send(event).await.map_err(|_| NotifyError::Closed)
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
