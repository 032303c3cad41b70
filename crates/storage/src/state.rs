// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from operation replay

use crate::operation::Operation;
use restraint_core::{ConstraintId, Consumer, ConsumerId, ResourceConstraint, UnitKey};
use std::collections::{BTreeMap, HashMap};

/// Versioned consumer set of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSnapshot {
    pub key: UnitKey,
    /// Zero for a unit that was never written
    pub version: u64,
    pub consumers: Vec<Consumer>,
}

impl UnitSnapshot {
    pub fn empty(key: UnitKey) -> Self {
        Self {
            key,
            version: 0,
            consumers: Vec::new(),
        }
    }

    pub fn consumer(&self, consumer_id: &ConsumerId) -> Option<&Consumer> {
        self.consumers.iter().find(|c| &c.id == consumer_id)
    }
}

#[derive(Debug, Clone, Default)]
struct UnitRecord {
    version: u64,
    consumers: Vec<Consumer>,
}

/// State built from applied operations
#[derive(Debug, Default)]
pub struct MaterializedState {
    constraints: HashMap<ConstraintId, ResourceConstraint>,
    orders: HashMap<ConstraintId, u64>,
    units: BTreeMap<UnitKey, UnitRecord>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::ConstraintCreate { constraint } => {
                if self
                    .constraint_by_name(&constraint.account_id, &constraint.name)
                    .is_none()
                {
                    self.constraints
                        .insert(constraint.id.clone(), constraint.clone());
                }
            }

            Operation::OrderReserve {
                constraint_id,
                order,
            } => {
                let current = self.orders.entry(constraint_id.clone()).or_insert(0);
                *current = (*current).max(*order);
            }

            Operation::UnitCommit {
                key,
                version,
                consumers,
            } => {
                let record = self.units.entry(key.clone()).or_default();
                if *version > record.version {
                    record.version = *version;
                    record.consumers = consumers.clone();
                }
            }
        }
    }

    pub fn constraint(&self, id: &ConstraintId) -> Option<&ResourceConstraint> {
        self.constraints.get(id)
    }

    pub fn constraint_by_name(&self, account_id: &str, name: &str) -> Option<&ResourceConstraint> {
        self.constraints
            .values()
            .find(|c| c.matches(account_id, name))
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Highest order handed out for a constraint
    pub fn last_order(&self, constraint_id: &ConstraintId) -> u64 {
        self.orders.get(constraint_id).copied().unwrap_or(0)
    }

    pub fn unit_version(&self, key: &UnitKey) -> u64 {
        self.units.get(key).map(|r| r.version).unwrap_or(0)
    }

    pub fn unit(&self, key: &UnitKey) -> UnitSnapshot {
        match self.units.get(key) {
            Some(record) => UnitSnapshot {
                key: key.clone(),
                version: record.version,
                consumers: record.consumers.clone(),
            },
            None => UnitSnapshot::empty(key.clone()),
        }
    }

    /// Units that currently have at least one consumer
    pub fn occupied_units(&self) -> Vec<UnitSnapshot> {
        self.units
            .iter()
            .filter(|(_, r)| !r.consumers.is_empty())
            .map(|(key, r)| UnitSnapshot {
                key: key.clone(),
                version: r.version,
                consumers: r.consumers.clone(),
            })
            .collect()
    }

    pub fn consumers_for_release_entity(&self, release_entity_id: &str) -> Vec<Consumer> {
        self.units
            .values()
            .flat_map(|r| r.consumers.iter())
            .filter(|c| c.release_entity_id() == release_entity_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
