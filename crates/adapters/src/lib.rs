// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters between the restraint engine and the workflow engine around it

pub mod notify;
pub mod render;
pub mod scope;
pub mod traced;

pub use notify::{ChannelNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use render::{ExpressionRenderer, TemplateRenderer};
pub use scope::{NoOpScopeAdapter, ScopeAdapter, ScopeError};
pub use traced::{TracedNotifyAdapter, TracedScopeAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifyAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use scope::{FakeScopeAdapter, ScopeCall};
