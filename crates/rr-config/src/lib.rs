//! Run configuration loading and validation (`rr.toml`).

pub mod config;
pub mod validate;

pub use config::{
    ChunksConfig, DEFAULT_CONFIG_FILE, RateLimitConfig, RunConfig, RunOverrides,
    SubmissionConfig,
};
pub use validate::validate_config;
