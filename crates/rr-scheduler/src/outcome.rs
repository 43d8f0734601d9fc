//! Folding an identity outcome into its pool record.

use chrono::{DateTime, Utc};
use rr_core::{IdentityRecord, Operational};

use crate::identity::IdentityOutcome;
use crate::tracker::UnitResult;

/// Effect of one outcome on the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub result: UnitResult,
    /// The service reported throttling; the next chunk must cool down first.
    pub rate_limited: bool,
}

impl IdentityOutcome {
    /// Update `record` (if the identity is still in the pool) and classify
    /// the outcome.
    ///
    /// `PreviouslyTimedOut` leaves the record untouched. Every other outcome
    /// stamps the attempt time. A rate-limit code never disables the
    /// identity; it only flags the run.
    pub fn apply(
        &self,
        record: Option<&mut IdentityRecord>,
        now: DateTime<Utc>,
        rate_limit_code: i64,
    ) -> Applied {
        let is_rate_limit = |code: &Option<i64>| *code == Some(rate_limit_code);

        let (result, rate_limited, update): (UnitResult, bool, Update) = match self {
            Self::Sent { .. } => (UnitResult::Sent, false, Update::Attempted),
            Self::NeedsManualStep => (UnitResult::Failed, false, Update::ManualStep),
            Self::PreviouslyTimedOut => (UnitResult::Ignored, false, Update::None),
            Self::SubmitFailed { code, .. } => {
                let limited = is_rate_limit(code);
                let update = match code {
                    Some(code) if !limited => Update::Status(Operational::Failed(*code)),
                    _ => Update::Attempted,
                };
                (UnitResult::Failed, limited, update)
            }
            Self::ConnectionFailed { code, .. } => {
                let limited = is_rate_limit(code);
                let status = if limited {
                    Operational::Usable
                } else {
                    Operational::from_error_code(*code)
                };
                (UnitResult::Failed, limited, Update::Status(status))
            }
            Self::SetupFailed { code, .. } => (
                UnitResult::Failed,
                false,
                Update::Status(Operational::from_error_code(*code)),
            ),
        };

        if let Some(record) = record {
            match update {
                Update::None => {}
                Update::Attempted => record.record_attempt(now),
                Update::ManualStep => {
                    record.requires_manual_step = true;
                    record.record_attempt(now);
                }
                Update::Status(status) => {
                    record.operational = status;
                    record.record_attempt(now);
                }
            }
        }

        Applied {
            result,
            rate_limited,
        }
    }
}

enum Update {
    None,
    Attempted,
    ManualStep,
    Status(Operational),
}
