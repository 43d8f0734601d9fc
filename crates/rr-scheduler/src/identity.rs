//! Per-identity lifecycle: connect, wait until ready, submit, disconnect.
//!
//! Each identity runs in its own task and owns its session for the whole
//! lifecycle. The session is always disconnected before the outcome is
//! handed back to the coordinator.

use std::time::Duration;
use tracing::{info, warn};

use crate::session::{
    ConnectRequest, IdentitySession, SessionEvent, SessionFactory, SubmitError, Submission,
};

/// Settings shared by every identity task of a run.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub submission: Submission,
    /// Pause between the session becoming ready and submitting.
    pub connect_to_submit_delay: Duration,
}

/// Terminal result of one identity's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    Sent { confirmation_id: String },
    NeedsManualStep,
    /// Submission raced a disconnect the service had already performed.
    PreviouslyTimedOut,
    SubmitFailed { code: Option<i64>, message: String },
    ConnectionFailed { code: Option<i64>, message: String },
    SetupFailed { code: Option<i64>, message: String },
}

enum Phase {
    Connecting,
    Authenticated,
    Submitting,
    Done(IdentityOutcome),
}

pub async fn run_identity<F: SessionFactory>(
    factory: &F,
    request: ConnectRequest,
    plan: &DispatchPlan,
) -> IdentityOutcome {
    info!(proxy = ?request.proxy.as_ref().map(|p| p.as_str()), "Logging in");

    let mut session = match factory.connect(request).await {
        Ok(session) => session,
        Err(err) => {
            warn!(code = ?err.code, "{err}");
            return IdentityOutcome::SetupFailed {
                code: err.code,
                message: err.message,
            };
        }
    };

    let mut phase = Phase::Connecting;
    let outcome = loop {
        phase = match phase {
            Phase::Connecting | Phase::Authenticated => await_ready(&mut session, plan).await,
            Phase::Submitting => submit(&mut session, &plan.submission).await,
            Phase::Done(outcome) => break outcome,
        };
    };

    session.disconnect().await;
    outcome
}

async fn await_ready<S: IdentitySession>(session: &mut S, plan: &DispatchPlan) -> Phase {
    match session.next_event().await {
        Some(SessionEvent::LoggedOn) => {
            info!("Logged in");
            Phase::Authenticated
        }
        Some(SessionEvent::Ready) => {
            info!("Ready to submit");
            tokio::time::sleep(plan.connect_to_submit_delay).await;
            Phase::Submitting
        }
        Some(SessionEvent::NeedsManualStep) => {
            warn!("Requires a manual step");
            Phase::Done(IdentityOutcome::NeedsManualStep)
        }
        Some(SessionEvent::Error { code, message }) => {
            warn!(?code, "Connection error: {message}");
            Phase::Done(IdentityOutcome::ConnectionFailed { code, message })
        }
        None => {
            warn!("Session closed before becoming ready");
            Phase::Done(IdentityOutcome::ConnectionFailed {
                code: None,
                message: "session closed before becoming ready".to_string(),
            })
        }
    }
}

async fn submit<S: IdentitySession>(session: &mut S, submission: &Submission) -> Phase {
    match session.submit(submission).await {
        Ok(confirmation) => Phase::Done(IdentityOutcome::Sent {
            confirmation_id: confirmation.confirmation_id,
        }),
        Err(SubmitError::PreviouslyTimedOut) => Phase::Done(IdentityOutcome::PreviouslyTimedOut),
        Err(SubmitError::Rejected { code, message }) => {
            warn!(?code, "Submission failed: {message}");
            Phase::Done(IdentityOutcome::SubmitFailed { code, message })
        }
    }
}
