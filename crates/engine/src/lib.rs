// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Resource restraint engine: queue steps, reconciliation and monitoring

mod config;
mod error;
mod facilitator;
mod monitor;
mod observer;
mod reconcile;
mod registry;
mod request;
mod runtime;
mod step;

pub use config::{ConfigError, EngineConfig, MonitorConfig, ObserverConfig, RegistrationConfig};
pub use error::StepError;
pub use facilitator::{AdmissionFacilitator, Assessment, ExecutionMode};
pub use monitor::{PersistenceMonitor, RestraintStats};
pub use observer::{ObserverHandle, ObserverRequest, ReconciliationObserver, RoutingNotifyAdapter};
pub use reconcile::ReconcileReport;
pub use registry::ConstraintRegistry;
pub use request::{StepKind, StepParameters};
pub use runtime::{Runtime, RuntimeDeps};
pub use step::{QueueStep, ResumeResult, StepOutcome, Suspension};
