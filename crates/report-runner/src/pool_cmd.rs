use anyhow::Result;
use chrono::Utc;
use rr_config::RunConfig;
use rr_pool::JsonStateStore;
use std::path::Path;

/// Handle `rr pool status`. Uses the file config as-is; no overrides apply.
pub(crate) fn handle_pool_status(config_path: &Path) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let pool = JsonStateStore::new(&config.pool_path).load()?;
    let status = pool.status(Utc::now(), config.cooldown());

    println!("Pool: {}", config.pool_path.display());
    println!("  total:         {}", status.total);
    println!("  eligible:      {}", status.eligible);
    println!("  cooling down:  {}", status.cooling_down);
    println!("  disabled:      {}", status.disabled);
    println!("  manual step:   {}", status.manual_step);
    Ok(())
}
