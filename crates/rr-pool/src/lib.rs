//! Identity pool: eligibility selection and the on-disk state file.

pub mod eligibility;
pub mod pool;
pub mod store;

pub use eligibility::{EligibleIdentity, is_eligible, select_eligible};
pub use pool::{IdentityPool, PoolStatus};
pub use store::{JsonStateStore, StatePersister};
