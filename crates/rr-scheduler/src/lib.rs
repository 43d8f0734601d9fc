//! Scheduler: chunk planning, proxy rotation, outcome tracking and the batch loop.

pub mod chunk;
pub mod identity;
pub mod outcome;
pub mod proxy;
pub mod scheduler;
pub mod session;
pub mod tracker;

pub use chunk::plan_chunks;
pub use identity::{DispatchPlan, IdentityOutcome, run_identity};
pub use outcome::Applied;
pub use proxy::ProxyRotator;
pub use scheduler::{BatchScheduler, ChunkReport, RunEnd, RunReport, SchedulerSettings};
pub use session::{
    Confirmation, ConnectRequest, IdentitySession, SessionEvent, SessionFactory, SetupError,
    SubmitError, Submission,
};
pub use tracker::{Completion, OutcomeTracker, UnitResult};
