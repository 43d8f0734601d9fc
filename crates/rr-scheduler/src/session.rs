//! Contract between the scheduler and a session backend.
//!
//! A backend knows how to authenticate an identity and submit one unit of
//! work. The scheduler only consumes the event stream and the submission
//! result; it never inspects credentials or confirmation payloads.

use async_trait::async_trait;
use rr_core::{Credentials, ProxyUrl};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub username: String,
    pub credentials: Credentials,
    /// `None` connects directly.
    pub proxy: Option<ProxyUrl>,
}

/// Lifecycle notifications emitted by a session until it is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedOn,
    Ready,
    NeedsManualStep,
    Error { code: Option<i64>, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub target_id: String,
    pub timeout: Duration,
    pub flags: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub confirmation_id: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The session was already dropped by the service when the submission
    /// went out. Benign; the scheduler does not count it.
    #[error("previously timed out")]
    PreviouslyTimedOut,

    #[error("submission rejected (code {code:?}): {message}")]
    Rejected { code: Option<i64>, message: String },
}

/// Building the session failed before any event was produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("session setup failed (code {code:?}): {message}")]
pub struct SetupError {
    pub code: Option<i64>,
    pub message: String,
}

#[async_trait]
pub trait IdentitySession: Send {
    /// Next lifecycle event, or `None` once the session has closed.
    async fn next_event(&mut self) -> Option<SessionEvent>;

    async fn submit(&mut self, submission: &Submission) -> Result<Confirmation, SubmitError>;

    async fn disconnect(&mut self);
}

#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: IdentitySession + 'static;

    async fn connect(&self, request: ConnectRequest) -> Result<Self::Session, SetupError>;
}
