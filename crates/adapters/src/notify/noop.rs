// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notification adapter

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use restraint_core::Event;

/// Drops every event.
///
/// Used when nothing resumes steps from events, e.g. when the engine polls
/// the resume handler instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotifyAdapter;

impl NoOpNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for NoOpNotifyAdapter {
    async fn notify(&self, _event: Event) -> Result<(), NotifyError> {
        Ok(())
    }
}
