#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(
        "{available}/{total} identities available but {needed} are needed for this run"
    )]
    InsufficientIdentities {
        available: usize,
        total: usize,
        needed: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file {path}: {message}")]
    StateFile { path: String, message: String },
}
