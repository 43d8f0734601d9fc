use anyhow::{Context, Result};
use rr_config::{RunConfig, RunOverrides, validate_config};
use rr_pool::JsonStateStore;
use rr_scheduler::{BatchScheduler, SchedulerSettings};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::loopback::LoopbackFactory;

/// Load, override and validate the run configuration.
pub(crate) fn load_config(config_path: &Path, overrides: &RunOverrides) -> Result<RunConfig> {
    let mut config = RunConfig::load(config_path)?;
    config.apply_overrides(overrides);
    validate_config(&config)
        .with_context(|| format!("Invalid config: {}", config_path.display()))?;
    Ok(config)
}

/// Handle `rr run`.
///
/// The pool file is only written at the scheduler's synchronization points.
/// When too few identities are eligible the command fails before anything is
/// written.
pub(crate) async fn handle_run(
    config_path: &Path,
    overrides: RunOverrides,
    loopback_latency_ms: u64,
) -> Result<()> {
    let config = load_config(config_path, &overrides)?;
    let store = JsonStateStore::new(&config.pool_path);
    let mut pool = store.load()?;

    info!(
        pool = %store.path().display(),
        identities = pool.len(),
        target_id = %config.target_id,
        "Loaded identity pool"
    );

    let factory = LoopbackFactory::new(Duration::from_millis(loopback_latency_ms));
    let scheduler = BatchScheduler::new(SchedulerSettings::from_config(&config), factory, store);
    let report = scheduler.run(&mut pool).await?;

    println!("{}", report.summary());
    Ok(())
}
