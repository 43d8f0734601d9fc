//! In-process session backend.
//!
//! Every identity logs on, becomes ready and gets a generated confirmation
//! after a fixed latency. Useful for rehearsing chunk pacing and pool
//! persistence; real backends implement the same two traits.

use async_trait::async_trait;
use rr_scheduler::{
    Confirmation, ConnectRequest, IdentitySession, SessionEvent, SessionFactory, SetupError,
    SubmitError, Submission,
};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopbackFactory {
    latency: Duration,
}

impl LoopbackFactory {
    pub(crate) fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

pub(crate) struct LoopbackSession {
    latency: Duration,
    events: VecDeque<SessionEvent>,
    connected: bool,
}

#[async_trait]
impl SessionFactory for LoopbackFactory {
    type Session = LoopbackSession;

    async fn connect(&self, request: ConnectRequest) -> Result<LoopbackSession, SetupError> {
        debug!(username = %request.username, proxy = ?request.proxy, "Loopback connect");
        Ok(LoopbackSession {
            latency: self.latency,
            events: VecDeque::from([SessionEvent::LoggedOn, SessionEvent::Ready]),
            connected: true,
        })
    }
}

#[async_trait]
impl IdentitySession for LoopbackSession {
    async fn next_event(&mut self) -> Option<SessionEvent> {
        tokio::time::sleep(self.latency).await;
        self.events.pop_front()
    }

    async fn submit(&mut self, submission: &Submission) -> Result<Confirmation, SubmitError> {
        if !self.connected {
            return Err(SubmitError::PreviouslyTimedOut);
        }
        tokio::time::sleep(self.latency.min(submission.timeout)).await;
        Ok(Confirmation {
            confirmation_id: ulid::Ulid::new().to_string(),
        })
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }
}
