//! Which identities may take part in a run.
//!
//! Computed once per run; nothing is re-checked while chunks are in flight.

use chrono::{DateTime, Utc};
use rr_core::{AppError, Credentials, IdentityRecord};
use std::time::Duration;
use tracing::debug;

use crate::pool::IdentityPool;

/// An identity picked for this run, detached from the pool so it can be
/// moved into its own task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleIdentity {
    pub username: String,
    pub credentials: Credentials,
}

/// True once at least `cooldown` has passed since the last attempt.
/// Identities that were never attempted are always past their cooldown;
/// a last attempt in the future never is.
pub(crate) fn cooldown_elapsed(
    record: &IdentityRecord,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    match record.last_attempt_at {
        None => true,
        Some(last) => match now.signed_duration_since(last).to_std() {
            Ok(elapsed) => elapsed >= cooldown,
            Err(_) => false,
        },
    }
}

pub fn is_eligible(record: &IdentityRecord, now: DateTime<Utc>, cooldown: Duration) -> bool {
    record.operational.is_usable()
        && !record.requires_manual_step
        && cooldown_elapsed(record, now, cooldown)
}

/// Pick the first `target` eligible identities in pool order.
///
/// Fails with `AppError::InsufficientIdentities` when fewer than `target`
/// are eligible. Nothing is mutated either way.
pub fn select_eligible(
    pool: &IdentityPool,
    now: DateTime<Utc>,
    cooldown: Duration,
    target: usize,
) -> Result<Vec<EligibleIdentity>, AppError> {
    let available: Vec<(&str, &IdentityRecord)> = pool
        .iter()
        .filter(|(_, record)| is_eligible(record, now, cooldown))
        .collect();

    debug!(
        available = available.len(),
        total = pool.len(),
        target,
        "Computed eligible identities"
    );

    if available.len() < target {
        return Err(AppError::InsufficientIdentities {
            available: available.len(),
            total: pool.len(),
            needed: target,
        });
    }

    Ok(available
        .into_iter()
        .take(target)
        .map(|(username, record)| EligibleIdentity {
            username: username.to_string(),
            credentials: record.credentials.clone(),
        })
        .collect())
}
