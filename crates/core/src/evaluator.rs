// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Constraint evaluation
//!
//! Pure functions over the consumers registered for one unit. Nothing here
//! reads or writes storage; callers load a unit, evaluate, and commit.

use crate::consumer::{Consumer, ConsumerId, ConsumerState};
use crate::error::ConstraintError;

/// Permits held by ACTIVE consumers
pub fn used_permits(consumers: &[Consumer]) -> u32 {
    consumers
        .iter()
        .filter(|c| c.is_active())
        .fold(0u32, |acc, c| acc.saturating_add(c.permits))
}

/// Permits not held by any ACTIVE consumer
pub fn available_permits(capacity: u32, consumers: &[Consumer]) -> u32 {
    capacity.saturating_sub(used_permits(consumers))
}

/// Reject requests that can never be satisfied
pub fn validate_permits(capacity: u32, permits: u32) -> Result<(), ConstraintError> {
    if permits == 0 {
        return Err(ConstraintError::InvalidPermits { permits });
    }
    if permits > capacity {
        return Err(ConstraintError::PermanentlyBlockedConsumer { permits, capacity });
    }
    Ok(())
}

/// Classify a new request against the consumers already registered for its unit.
///
/// The request is newer than every existing consumer, so any BLOCKED consumer
/// keeps it waiting even if its permits would fit.
pub fn evaluate(
    capacity: u32,
    consumers: &[Consumer],
    permits: u32,
) -> Result<ConsumerState, ConstraintError> {
    validate_permits(capacity, permits)?;

    if consumers.iter().any(Consumer::is_blocked) {
        return Ok(ConsumerState::Blocked);
    }

    if used_permits(consumers).saturating_add(permits) <= capacity {
        Ok(ConsumerState::Active)
    } else {
        Ok(ConsumerState::Blocked)
    }
}

/// Promote BLOCKED consumers in registration order while they fit.
///
/// ACTIVE consumers are never demoted. Promotion stops at the first waiting
/// consumer that does not fit. Returns the promoted ids in promotion order.
pub fn promote(capacity: u32, consumers: &mut [Consumer]) -> Vec<ConsumerId> {
    let mut used = used_permits(consumers);

    let mut waiting: Vec<usize> = consumers
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_blocked())
        .map(|(i, _)| i)
        .collect();
    waiting.sort_by_key(|&i| consumers[i].order);

    let mut promoted = Vec::new();
    for i in waiting {
        let consumer = &mut consumers[i];
        let next = used.saturating_add(consumer.permits);
        if next > capacity {
            break;
        }
        consumer.state = ConsumerState::Active;
        used = next;
        promoted.push(consumer.id.clone());
    }
    promoted
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
