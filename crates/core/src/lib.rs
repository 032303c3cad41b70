// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! restraint-core: data model and evaluation for resource restraints
//!
//! This crate provides:
//! - Constraint, consumer, and holding-scope types
//! - The pure constraint evaluator and the per-unit ledger state machine
//! - Events published when a unit's consumer set changes
//! - Clock and ID abstractions, and the resource unit expression check

pub mod clock;
pub mod id;

pub mod constraint;
pub mod consumer;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod ledger;
pub mod scope;
pub mod template;

pub use clock::{Clock, FakeClock, SystemClock};
pub use constraint::{
    ConstraintId, ResourceConstraint, Strategy, QUEUE_CONSTRAINT_CAPACITY, QUEUE_CONSTRAINT_NAME,
};
pub use consumer::{Consumer, ConsumerContext, ConsumerId, ConsumerState, UnitKey};
pub use error::ConstraintError;
pub use event::Event;
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use ledger::{LedgerInput, UnitLedger};
pub use scope::{AcquireMode, ExecutionContext, HoldingScope};
