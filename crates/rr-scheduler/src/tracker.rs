//! Run-wide and per-chunk completion accounting.
//!
//! Owned by the coordinating task; identity tasks never touch it directly.

use tracing::debug;

/// How a single identity's outcome counts toward the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitResult {
    Sent,
    Failed,
    /// Finished, but neither sent nor failed.
    Ignored,
}

/// What the coordinator must do after recording an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Pending,
    ChunkComplete,
    RunComplete,
}

#[derive(Debug, Clone)]
pub struct OutcomeTracker {
    target: usize,
    sent: usize,
    failed: usize,
    chunk_expected: usize,
    chunk_observed: usize,
    chunk_signalled: bool,
    run_signalled: bool,
}

impl OutcomeTracker {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            sent: 0,
            failed: 0,
            chunk_expected: 0,
            chunk_observed: 0,
            chunk_signalled: false,
            run_signalled: false,
        }
    }

    pub fn begin_chunk(&mut self, size: usize) {
        self.chunk_expected = size;
        self.chunk_observed = 0;
        self.chunk_signalled = false;
    }

    /// Record one outcome and report which completion, if any, it triggered.
    ///
    /// `RunComplete` is returned once, the first time `sent + failed`
    /// reaches the target, and wins over `ChunkComplete` when both trigger
    /// together. After that every outcome is dropped. `ChunkComplete` is
    /// returned once per chunk.
    pub fn record(&mut self, result: UnitResult) -> Completion {
        if self.run_signalled {
            debug!(?result, "Run already complete; outcome dropped");
            return Completion::Pending;
        }

        self.chunk_observed += 1;
        match result {
            UnitResult::Sent => self.sent += 1,
            UnitResult::Failed => self.failed += 1,
            UnitResult::Ignored => {}
        }

        if self.sent + self.failed >= self.target {
            self.run_signalled = true;
            return Completion::RunComplete;
        }

        if !self.chunk_signalled && self.chunk_observed >= self.chunk_expected {
            self.chunk_signalled = true;
            return Completion::ChunkComplete;
        }

        Completion::Pending
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn is_run_complete(&self) -> bool {
        self.run_signalled
    }
}
