// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published when the consumer set of a unit changes
//!
//! The engine's scheduler consumes these to resume suspended steps.

use crate::constraint::ConstraintId;
use crate::consumer::{ConsumerId, ConsumerState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ConsumerRegistered {
        consumer_id: ConsumerId,
        constraint_id: ConstraintId,
        unit: String,
        permits: u32,
        state: ConsumerState,
        order: u64,
        release_entity_id: String,
    },
    /// A waiting consumer now holds its permits; its step may resume
    ConsumerUnblocked {
        consumer_id: ConsumerId,
        constraint_id: ConstraintId,
        unit: String,
        claimant_id: String,
        release_entity_id: String,
    },
    /// Removed by an abort
    ConsumerReleased {
        consumer_id: ConsumerId,
        constraint_id: ConstraintId,
        unit: String,
        permits: u32,
        release_entity_id: String,
    },
    /// Removed because its release entity ended
    ConsumerSwept {
        consumer_id: ConsumerId,
        constraint_id: ConstraintId,
        unit: String,
        state: ConsumerState,
        release_entity_id: String,
    },
    ScopeEnded {
        release_entity_id: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ConsumerRegistered { .. } => "consumer:registered",
            Event::ConsumerUnblocked { .. } => "consumer:unblocked",
            Event::ConsumerReleased { .. } => "consumer:released",
            Event::ConsumerSwept { .. } => "consumer:swept",
            Event::ScopeEnded { .. } => "scope:ended",
        }
    }

    /// The consumer this event is about, if any
    pub fn consumer_id(&self) -> Option<&ConsumerId> {
        match self {
            Event::ConsumerRegistered { consumer_id, .. }
            | Event::ConsumerUnblocked { consumer_id, .. }
            | Event::ConsumerReleased { consumer_id, .. }
            | Event::ConsumerSwept { consumer_id, .. } => Some(consumer_id),
            Event::ScopeEnded { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
