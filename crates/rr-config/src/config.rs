use anyhow::{Context, Result};
use rr_core::ProxyUrl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "rr.toml";

/// Everything one run needs, read from `rr.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Identifier of the thing being reported. Passed to every submission.
    #[serde(default)]
    pub target_id: String,
    /// Number of units to complete (sent + failed) before the run stops.
    #[serde(default = "default_report_count")]
    pub report_count: usize,
    /// Identity pool file, relative to the config file's directory.
    #[serde(default = "default_pool_path")]
    pub pool_path: PathBuf,
    /// Minimum time since an identity's last attempt before it is eligible again.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// One-off delay before the first chunk.
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
    /// Egress proxies, rotated every `chunks.switch_proxy_every` chunks.
    /// Empty means connect directly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<ProxyUrl>,
    #[serde(default)]
    pub chunks: ChunksConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunksConfig {
    /// Identities dispatched concurrently per chunk.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_switch_proxy_every")]
    pub switch_proxy_every: usize,
    /// Pause after a chunk drains so its log output settles.
    #[serde(default = "default_beautify_delay_ms")]
    pub beautify_delay_ms: u64,
    #[serde(default = "default_inter_chunk_delay_ms")]
    pub inter_chunk_delay_ms: u64,
    /// Wait between a session becoming ready and its submission.
    #[serde(default = "default_connect_to_submit_delay_ms")]
    pub connect_to_submit_delay_ms: u64,
}

impl Default for ChunksConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            switch_proxy_every: default_switch_proxy_every(),
            beautify_delay_ms: default_beautify_delay_ms(),
            inter_chunk_delay_ms: default_inter_chunk_delay_ms(),
            connect_to_submit_delay_ms: default_connect_to_submit_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Result code the service uses to signal throttling.
    #[serde(default = "default_rate_limit_code")]
    pub code: i64,
    /// Wait before the chunk following a throttled one.
    #[serde(default = "default_rate_limit_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            code: default_rate_limit_code(),
            cooldown_ms: default_rate_limit_cooldown_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_submit_timeout_ms")]
    pub timeout_ms: u64,
    /// Service-specific switches, forwarded verbatim with each submission.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_submit_timeout_ms(),
            flags: BTreeMap::new(),
        }
    }
}

fn default_report_count() -> usize {
    1
}

fn default_pool_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

fn default_cooldown_secs() -> u64 {
    24 * 60 * 60
}

fn default_warmup_ms() -> u64 {
    5_000
}

fn default_chunk_size() -> usize {
    100
}

fn default_switch_proxy_every() -> usize {
    1
}

fn default_beautify_delay_ms() -> u64 {
    2_000
}

fn default_inter_chunk_delay_ms() -> u64 {
    60_000
}

fn default_connect_to_submit_delay_ms() -> u64 {
    1_000
}

fn default_rate_limit_code() -> i64 {
    84
}

fn default_rate_limit_cooldown_ms() -> u64 {
    5 * 60 * 1_000
}

fn default_submit_timeout_ms() -> u64 {
    30_000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_id: String::new(),
            report_count: default_report_count(),
            pool_path: default_pool_path(),
            cooldown_secs: default_cooldown_secs(),
            warmup_ms: default_warmup_ms(),
            proxies: Vec::new(),
            chunks: ChunksConfig::default(),
            rate_limit: RateLimitConfig::default(),
            submission: SubmissionConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the file. Target and count
/// are separate named inputs; neither is positional.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub target_id: Option<String>,
    pub report_count: Option<usize>,
}

impl RunConfig {
    /// Read and parse a config file. A relative `pool_path` is resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        if config.pool_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.pool_path = dir.join(&config.pool_path);
            }
        }
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &RunOverrides) {
        if let Some(target_id) = &overrides.target_id {
            tracing::debug!(target_id = %target_id, "Overriding target_id from command line");
            self.target_id = target_id.clone();
        }
        if let Some(count) = overrides.report_count {
            tracing::debug!(count, "Overriding report_count from command line");
            self.report_count = count;
        }
    }

    /// Chunk size as a non-zero value. Callers run `validate_config` first;
    /// an unvalidated zero falls back to one identity per chunk.
    pub fn chunk_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.chunks.size).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn beautify_delay(&self) -> Duration {
        Duration::from_millis(self.chunks.beautify_delay_ms)
    }

    pub fn inter_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunks.inter_chunk_delay_ms)
    }

    pub fn connect_to_submit_delay(&self) -> Duration {
        Duration::from_millis(self.chunks.connect_to_submit_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit.cooldown_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submission.timeout_ms)
    }
}
