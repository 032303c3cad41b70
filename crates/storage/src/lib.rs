// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for resource constraints and their consumers

mod operation;
mod state;
mod store;
mod wal;

pub use operation::Operation;
pub use state::{MaterializedState, UnitSnapshot};
pub use store::{ConstraintStore, Journal, MemoryStore, NoJournal, StateStore, StoreError, WalStore};
pub use wal::{Wal, WalError};
