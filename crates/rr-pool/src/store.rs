//! Pool file persistence.
//!
//! The file is a JSON object of `username -> record`, indented with four
//! spaces so it stays pleasant to edit by hand. Every write replaces the whole
//! file through a temp file and rename, so a crash mid-write leaves the
//! previous version intact.

use anyhow::{Context, Result};
use rr_core::AppError;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::pool::IdentityPool;

/// Sink for pool snapshots taken at the scheduler's synchronization points.
pub trait StatePersister: Send + Sync {
    fn persist(&self, pool: &IdentityPool) -> Result<()>;
}

impl<T: StatePersister + ?Sized> StatePersister for std::sync::Arc<T> {
    fn persist(&self, pool: &IdentityPool) -> Result<()> {
        (**self).persist(pool)
    }
}

#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<IdentityPool> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read pool file: {}", self.path.display()))?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::StateFile {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

fn to_pretty_json(pool: &IdentityPool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    pool.serialize(&mut serializer)
        .context("Failed to serialize identity pool")?;
    buf.push(b'\n');
    Ok(buf)
}

impl StatePersister for JsonStateStore {
    fn persist(&self, pool: &IdentityPool) -> Result<()> {
        let contents = to_pretty_json(pool)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&contents)
            .context("Failed to write identity pool")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush identity pool")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace pool file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), identities = pool.len(), "Persisted identity pool");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rr_core::{Credentials, IdentityRecord, Operational};
    use tempfile::tempdir;

    fn sample_pool() -> IdentityPool {
        let mut pool = IdentityPool::new();
        let mut alice = IdentityRecord::new(Credentials {
            password: "a-pw".into(),
            shared_secret: Some("a-secret".into()),
        });
        alice.record_attempt(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        pool.insert("alice", alice);

        let mut bob = IdentityRecord::new(Credentials {
            password: "b-pw".into(),
            shared_secret: None,
        });
        bob.operational = Operational::Failed(5);
        bob.requires_manual_step = true;
        pool.insert("bob", bob);
        pool
    }

    #[test]
    fn test_persist_then_load() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("accounts.json"));
        let pool = sample_pool();

        store.persist(&pool).unwrap();
        assert_eq!(store.load().unwrap(), pool);
    }

    #[test]
    fn test_persist_is_indented_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "{\"stale\": {\"password\": \"x\"}, \"junk\": 1}").unwrap();

        let store = JsonStateStore::new(&path);
        store.persist(&sample_pool()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"alice\": {\n        "));
        assert!(text.contains("\"operational\": 5"));
        assert!(!text.contains("stale"));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("nope.json"));
        let err = store.load().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read pool file"));
    }

    #[test]
    fn test_load_malformed_file_is_state_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonStateStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::StateFile { .. })
        ));
    }
}
