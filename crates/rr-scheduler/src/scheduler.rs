//! The batch loop.
//!
//! ```text
//! Warmup -> for each chunk:
//!     [RateLimitWait] -> Dispatch -> AwaitDrain -> [BeautifyDelay -> InterChunkDelay]
//! -> Done
//! ```
//!
//! Chunks run strictly one after another. Every identity in a chunk gets its
//! own task; the coordinator collects their outcomes one at a time, so the
//! pool, the counters and the rate-limit flag have a single writer.

use chrono::Utc;
use rr_config::RunConfig;
use rr_core::{AppError, ProxyUrl};
use rr_pool::{EligibleIdentity, IdentityPool, StatePersister, select_eligible};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::chunk::plan_chunks;
use crate::identity::{DispatchPlan, IdentityOutcome, run_identity};
use crate::outcome::Applied;
use crate::proxy::ProxyRotator;
use crate::session::{ConnectRequest, SessionFactory, Submission};
use crate::tracker::{Completion, OutcomeTracker, UnitResult};

/// Timing and sizing for one run, usually built from `RunConfig`.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub report_count: usize,
    pub chunk_size: NonZeroUsize,
    pub cooldown: Duration,
    pub warmup: Duration,
    pub beautify_delay: Duration,
    pub inter_chunk_delay: Duration,
    pub rate_limit_code: i64,
    pub rate_limit_cooldown: Duration,
    pub switch_proxy_every: usize,
    pub proxies: Vec<ProxyUrl>,
    pub dispatch: DispatchPlan,
}

impl SchedulerSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            report_count: config.report_count,
            chunk_size: config.chunk_size(),
            cooldown: config.cooldown(),
            warmup: config.warmup(),
            beautify_delay: config.beautify_delay(),
            inter_chunk_delay: config.inter_chunk_delay(),
            rate_limit_code: config.rate_limit.code,
            rate_limit_cooldown: config.rate_limit_cooldown(),
            switch_proxy_every: config.chunks.switch_proxy_every,
            proxies: config.proxies.clone(),
            dispatch: DispatchPlan {
                submission: Submission {
                    target_id: config.target_id.clone(),
                    timeout: config.submit_timeout(),
                    flags: config.submission.flags.clone(),
                },
                connect_to_submit_delay: config.connect_to_submit_delay(),
            },
        }
    }
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    /// `sent + failed` reached the report count.
    TargetReached,
    /// Every chunk drained without reaching it (some outcomes were ignored).
    ChunksExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub index: usize,
    pub size: usize,
    pub proxy: Option<ProxyUrl>,
    /// A rate-limit cooldown ran before this chunk was dispatched.
    pub waited_for_rate_limit: bool,
    /// Some identity in this chunk reported throttling.
    pub hit_rate_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub target: usize,
    pub sent: usize,
    pub failed: usize,
    pub end: RunEnd,
    pub chunks: Vec<ChunkReport>,
}

impl RunReport {
    /// One-line summary printed when the run finishes.
    pub fn summary(&self) -> String {
        format!(
            "Sent {}/{} report{}, {} report{} failed",
            self.sent,
            self.target,
            plural(self.target),
            self.failed,
            plural(self.failed)
        )
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Mutable state that lives for one run and belongs to the coordinator.
struct RunState {
    tracker: OutcomeTracker,
    rate_limited: bool,
    rotator: ProxyRotator,
}

enum ChunkEnd {
    Drained,
    RunComplete,
}

pub struct BatchScheduler<F: SessionFactory, P: StatePersister> {
    settings: SchedulerSettings,
    factory: Arc<F>,
    persister: P,
}

impl<F: SessionFactory, P: StatePersister> BatchScheduler<F, P> {
    pub fn new(settings: SchedulerSettings, factory: F, persister: P) -> Self {
        Self {
            settings,
            factory: Arc::new(factory),
            persister,
        }
    }

    /// Select eligible identities from `pool` and work through them.
    ///
    /// Returns `AppError::InsufficientIdentities` before any delay, dispatch
    /// or write when the pool cannot cover the report count. Per-identity
    /// failures never surface here; they only show up in the counters and
    /// the pool records.
    pub async fn run(&self, pool: &mut IdentityPool) -> Result<RunReport, AppError> {
        let target = self.settings.report_count;
        info!(
            report_count = target,
            "Getting {target} identit{}",
            if target == 1 { "y" } else { "ies" }
        );

        let selected = select_eligible(pool, Utc::now(), self.settings.cooldown, target)?;
        let chunks = plan_chunks(&selected, self.settings.chunk_size);

        let mut state = RunState {
            tracker: OutcomeTracker::new(target),
            rate_limited: false,
            rotator: ProxyRotator::new(self.settings.switch_proxy_every),
        };
        let mut reports = Vec::with_capacity(chunks.len());
        let mut end = RunEnd::ChunksExhausted;

        debug!(delay_ms = self.settings.warmup.as_millis() as u64, "Warming up");
        tokio::time::sleep(self.settings.warmup).await;

        let total = chunks.len();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let waited_for_rate_limit = state.rate_limited;
            if waited_for_rate_limit {
                info!(
                    "Hit the rate limit, waiting {}ms",
                    self.settings.rate_limit_cooldown.as_millis()
                );
                tokio::time::sleep(self.settings.rate_limit_cooldown).await;
                state.rate_limited = false;
            }

            let proxy = state.rotator.next(&self.settings.proxies).cloned();
            let size = chunk.len();
            info!(chunk = index + 1, chunks = total, size, "Dispatching chunk");

            let (chunk_end, hit_rate_limit) = self
                .dispatch_chunk(pool, chunk, proxy.clone(), &mut state)
                .await;
            state.rotator.chunk_completed();

            reports.push(ChunkReport {
                index,
                size,
                proxy,
                waited_for_rate_limit,
                hit_rate_limit,
            });

            if let ChunkEnd::RunComplete = chunk_end {
                end = RunEnd::TargetReached;
                break;
            }

            if index + 1 < total {
                tokio::time::sleep(self.settings.beautify_delay).await;
                info!(
                    "Waiting {} second{}",
                    self.settings.inter_chunk_delay.as_secs(),
                    plural(self.settings.inter_chunk_delay.as_secs() as usize)
                );
                tokio::time::sleep(self.settings.inter_chunk_delay).await;
            }
        }

        let report = RunReport {
            target,
            sent: state.tracker.sent(),
            failed: state.tracker.failed(),
            end,
            chunks: reports,
        };
        info!(sent = report.sent, failed = report.failed, end = ?report.end, "{}", report.summary());
        Ok(report)
    }

    /// Dispatch every identity of the chunk concurrently and fold outcomes in
    /// as they arrive. Returns once every task has finished.
    async fn dispatch_chunk(
        &self,
        pool: &mut IdentityPool,
        chunk: Vec<EligibleIdentity>,
        proxy: Option<ProxyUrl>,
        state: &mut RunState,
    ) -> (ChunkEnd, bool) {
        state.tracker.begin_chunk(chunk.len());
        let plan = Arc::new(self.settings.dispatch.clone());

        let mut tasks = JoinSet::new();
        for identity in chunk {
            let factory = Arc::clone(&self.factory);
            let plan = Arc::clone(&plan);
            let span = info_span!("identity", username = %identity.username);
            let request = ConnectRequest {
                username: identity.username.clone(),
                credentials: identity.credentials,
                proxy: proxy.clone(),
            };
            let username = identity.username;
            tasks.spawn(
                async move {
                    let outcome = run_identity(factory.as_ref(), request, &plan).await;
                    (username, outcome)
                }
                .instrument(span),
            );
        }

        let mut chunk_end = ChunkEnd::Drained;
        let mut hit_rate_limit = false;
        while let Some(joined) = tasks.join_next().await {
            if state.tracker.is_run_complete() {
                debug!("Outcome arrived after the run completed; ignoring");
                continue;
            }

            let applied = match joined {
                Ok((username, outcome)) => self.fold_outcome(pool, &username, &outcome, state),
                Err(err) => {
                    error!("Identity task aborted: {err}");
                    Applied {
                        result: UnitResult::Failed,
                        rate_limited: false,
                    }
                }
            };

            if applied.rate_limited {
                state.rate_limited = true;
                hit_rate_limit = true;
            }

            match state.tracker.record(applied.result) {
                Completion::RunComplete => {
                    self.persist(pool);
                    chunk_end = ChunkEnd::RunComplete;
                }
                Completion::ChunkComplete => self.persist(pool),
                Completion::Pending => {}
            }
        }

        (chunk_end, hit_rate_limit)
    }

    fn fold_outcome(
        &self,
        pool: &mut IdentityPool,
        username: &str,
        outcome: &IdentityOutcome,
        state: &RunState,
    ) -> Applied {
        let record = pool.get_mut(username);
        if record.is_none() {
            warn!(username, "Identity vanished from the pool; outcome not recorded");
        }
        let applied = outcome.apply(record, Utc::now(), self.settings.rate_limit_code);

        match outcome {
            IdentityOutcome::Sent { confirmation_id } => info!(
                username,
                "Successfully sent a report {}/{} - {confirmation_id}",
                state.tracker.sent() + 1,
                state.tracker.target()
            ),
            IdentityOutcome::PreviouslyTimedOut => {
                debug!(username, "Submission previously timed out; not counted")
            }
            _ => warn!(
                username,
                rate_limited = applied.rate_limited,
                "Has encountered an error: {outcome:?}"
            ),
        }
        applied
    }

    fn persist(&self, pool: &IdentityPool) {
        if let Err(err) = self.persister.persist(pool) {
            error!("Failed to persist identity pool: {err:#}");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
