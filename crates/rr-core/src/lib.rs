//! Shared types for report-runner: identity records and the error taxonomy.

pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{Credentials, IdentityRecord, Operational, ProxyUrl};
