use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an identity may be used.
///
/// Persisted the way the pool file has always stored it: `true` for usable
/// (including identities that were only rate limited), `false` for disabled
/// without a known cause, and the raw result code for identities the service
/// rejected with a specific code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOperational", into = "RawOperational")]
pub enum Operational {
    #[default]
    Usable,
    Disabled,
    Failed(i64),
}

impl Operational {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable)
    }

    /// Status for an identity whose connection or setup failed.
    ///
    /// A missing code disables the identity outright; any other code is kept
    /// verbatim so it can be cleared by hand later.
    pub fn from_error_code(code: Option<i64>) -> Self {
        match code {
            Some(code) => Self::Failed(code),
            None => Self::Disabled,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawOperational {
    Flag(bool),
    Code(i64),
}

impl From<RawOperational> for Operational {
    fn from(raw: RawOperational) -> Self {
        match raw {
            RawOperational::Flag(true) => Self::Usable,
            RawOperational::Flag(false) => Self::Disabled,
            RawOperational::Code(code) => Self::Failed(code),
        }
    }
}

impl From<Operational> for RawOperational {
    fn from(op: Operational) -> Self {
        match op {
            Operational::Usable => Self::Flag(true),
            Operational::Disabled => Self::Flag(false),
            Operational::Failed(code) => Self::Code(code),
        }
    }
}

impl std::fmt::Display for Operational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usable => write!(f, "usable"),
            Self::Disabled => write!(f, "disabled"),
            Self::Failed(code) => write!(f, "failed ({code})"),
        }
    }
}

/// Secrets handed to the session backend. Opaque to the scheduler.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &"[REDACTED]")
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// One worker identity as stored in the pool file, keyed by username.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(flatten)]
    pub credentials: Credentials,

    #[serde(default)]
    pub operational: Operational,

    /// Set when the identity needs out-of-band intervention (e.g. a second
    /// factor prompt). Only cleared by editing the pool file.
    #[serde(default)]
    pub requires_manual_step: bool,

    /// Last attempt, successful or not. Drives the cooldown window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl IdentityRecord {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            operational: Operational::Usable,
            requires_manual_step: false,
            last_attempt_at: None,
        }
    }

    pub fn record_attempt(&mut self, at: DateTime<Utc>) {
        self.last_attempt_at = Some(at);
    }
}

/// Egress proxy address, passed through to the session backend untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyUrl(pub String);

impl ProxyUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProxyUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
