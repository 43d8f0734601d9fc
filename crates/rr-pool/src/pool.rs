use chrono::{DateTime, Utc};
use rr_core::IdentityRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::eligibility::cooldown_elapsed;

/// All known identities, keyed by username.
///
/// Iteration order is the sorted username order, which is also the order
/// the pool file is written in. Selection relies on that order being stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityPool {
    records: BTreeMap<String, IdentityRecord>,
}

impl IdentityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, username: impl Into<String>, record: IdentityRecord) {
        self.records.insert(username.into(), record);
    }

    pub fn get(&self, username: &str) -> Option<&IdentityRecord> {
        self.records.get(username)
    }

    pub fn get_mut(&mut self, username: &str) -> Option<&mut IdentityRecord> {
        self.records.get_mut(username)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IdentityRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Breakdown of the pool for `rr pool status`.
    pub fn status(&self, now: DateTime<Utc>, cooldown: Duration) -> PoolStatus {
        let mut status = PoolStatus {
            total: self.records.len(),
            ..PoolStatus::default()
        };
        for record in self.records.values() {
            if record.requires_manual_step {
                status.manual_step += 1;
            } else if !record.operational.is_usable() {
                status.disabled += 1;
            } else if !cooldown_elapsed(record, now, cooldown) {
                status.cooling_down += 1;
            } else {
                status.eligible += 1;
            }
        }
        status
    }
}

impl FromIterator<(String, IdentityRecord)> for IdentityPool {
    fn from_iter<I: IntoIterator<Item = (String, IdentityRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Counts per bucket. Every identity lands in exactly one bucket, checked
/// in field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub total: usize,
    pub manual_step: usize,
    pub disabled: usize,
    pub cooling_down: usize,
    pub eligible: usize,
}
