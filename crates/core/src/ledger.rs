// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-unit consumer ledger state machine
//!
//! A ledger is the consumer set of one (constraint, unit) pair together with
//! the constraint's capacity. Every mutation the system performs on a unit
//! (register, release, sweep) is a transition here; storage only persists the
//! resulting consumer list.

use crate::consumer::{Consumer, ConsumerId, ConsumerState, UnitKey};
use crate::error::ConstraintError;
use crate::evaluator;
use crate::event::Event;
use std::collections::BTreeSet;

/// Consumers of a single unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitLedger {
    pub key: UnitKey,
    pub capacity: u32,
    pub consumers: Vec<Consumer>,
}

/// Inputs that change a unit's consumer set
#[derive(Clone, Debug)]
pub enum LedgerInput {
    /// Add a consumer; its state is computed, whatever the caller set
    Register { consumer: Consumer },
    /// Remove a consumer (abort); absent consumers are ignored
    Release { consumer_id: ConsumerId },
    /// Remove consumers whose release entity ended, then promote waiters
    Sweep { finished: BTreeSet<String> },
}

impl UnitLedger {
    pub fn new(key: UnitKey, capacity: u32, consumers: Vec<Consumer>) -> Self {
        Self {
            key,
            capacity,
            consumers,
        }
    }

    pub fn used_permits(&self) -> u32 {
        evaluator::used_permits(&self.consumers)
    }

    pub fn available_permits(&self) -> u32 {
        evaluator::available_permits(self.capacity, &self.consumers)
    }

    pub fn get(&self, consumer_id: &ConsumerId) -> Option<&Consumer> {
        self.consumers.iter().find(|c| &c.id == consumer_id)
    }

    pub fn blocked_count(&self) -> usize {
        self.consumers.iter().filter(|c| c.is_blocked()).count()
    }

    /// Permits a release entity currently holds. Waiting consumers hold nothing.
    pub fn acquired_by(&self, release_entity_id: &str) -> u32 {
        self.consumers
            .iter()
            .filter(|c| c.is_active())
            .filter(|c| c.release_entity_id() == release_entity_id)
            .fold(0u32, |acc, c| acc.saturating_add(c.permits))
    }

    /// Classify a request of `permits` without changing anything
    pub fn evaluate(&self, permits: u32) -> Result<ConsumerState, ConstraintError> {
        evaluator::evaluate(self.capacity, &self.consumers, permits)
    }

    /// Pure state transition function
    pub fn transition(&self, input: LedgerInput) -> Result<(UnitLedger, Vec<Event>), ConstraintError> {
        let mut ledger = self.clone();
        let mut events = Vec::new();

        match input {
            LedgerInput::Register { mut consumer } => {
                if consumer.constraint_id != self.key.constraint_id || consumer.unit != self.key.unit {
                    return Err(ConstraintError::InvalidRequest(format!(
                        "consumer {} belongs to {}/{}, not {}",
                        consumer.id, consumer.constraint_id, consumer.unit, self.key
                    )));
                }
                if self.get(&consumer.id).is_some() {
                    return Err(ConstraintError::InvalidRequest(format!(
                        "consumer {} is already registered",
                        consumer.id
                    )));
                }

                consumer.state = self.evaluate(consumer.permits)?;
                events.push(Event::ConsumerRegistered {
                    consumer_id: consumer.id.clone(),
                    constraint_id: consumer.constraint_id.clone(),
                    unit: consumer.unit.clone(),
                    permits: consumer.permits,
                    state: consumer.state,
                    order: consumer.order,
                    release_entity_id: consumer.context.release_entity_id.clone(),
                });
                ledger.consumers.push(consumer);
            }

            LedgerInput::Release { consumer_id } => {
                if let Some(pos) = ledger.consumers.iter().position(|c| c.id == consumer_id) {
                    let removed = ledger.consumers.remove(pos);
                    events.push(Event::ConsumerReleased {
                        consumer_id: removed.id,
                        constraint_id: removed.constraint_id,
                        unit: removed.unit,
                        permits: removed.permits,
                        release_entity_id: removed.context.release_entity_id,
                    });
                }
            }

            LedgerInput::Sweep { finished } => {
                let (ended, kept): (Vec<_>, Vec<_>) = ledger
                    .consumers
                    .into_iter()
                    .partition(|c| finished.contains(c.release_entity_id()));
                ledger.consumers = kept;

                for consumer in ended {
                    events.push(Event::ConsumerSwept {
                        consumer_id: consumer.id,
                        constraint_id: consumer.constraint_id,
                        unit: consumer.unit,
                        state: consumer.state,
                        release_entity_id: consumer.context.release_entity_id,
                    });
                }

                for id in evaluator::promote(ledger.capacity, &mut ledger.consumers) {
                    if let Some(consumer) = ledger.get(&id) {
                        events.push(Event::ConsumerUnblocked {
                            consumer_id: consumer.id.clone(),
                            constraint_id: consumer.constraint_id.clone(),
                            unit: consumer.unit.clone(),
                            claimant_id: consumer.claimant_id.clone(),
                            release_entity_id: consumer.context.release_entity_id.clone(),
                        });
                    }
                }
            }
        }

        Ok((ledger, events))
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
