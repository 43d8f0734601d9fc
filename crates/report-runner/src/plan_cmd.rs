use anyhow::Result;
use chrono::{DateTime, Utc};
use rr_config::{RunConfig, RunOverrides};
use rr_core::{AppError, ProxyUrl};
use rr_pool::{IdentityPool, JsonStateStore, select_eligible};
use rr_scheduler::{ProxyRotator, plan_chunks};
use std::path::Path;

use crate::run_cmd::load_config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedChunk {
    pub usernames: Vec<String>,
    pub proxy: Option<ProxyUrl>,
}

/// Dry-run the selection, chunking and proxy rotation of a run.
pub(crate) fn build_plan(
    config: &RunConfig,
    pool: &IdentityPool,
    now: DateTime<Utc>,
) -> Result<Vec<PlannedChunk>, AppError> {
    let selected = select_eligible(pool, now, config.cooldown(), config.report_count)?;
    let mut rotator = ProxyRotator::new(config.chunks.switch_proxy_every);

    Ok(plan_chunks(&selected, config.chunk_size())
        .into_iter()
        .map(|chunk| {
            let proxy = rotator.next(&config.proxies).cloned();
            rotator.chunk_completed();
            PlannedChunk {
                usernames: chunk.into_iter().map(|i| i.username).collect(),
                proxy,
            }
        })
        .collect())
}

pub(crate) fn handle_plan(config_path: &Path, overrides: RunOverrides) -> Result<()> {
    let config = load_config(config_path, &overrides)?;
    let pool = JsonStateStore::new(&config.pool_path).load()?;
    let plan = build_plan(&config, &pool, Utc::now())?;

    println!(
        "Target {}: {} report(s) in {} chunk(s)",
        config.target_id,
        config.report_count,
        plan.len()
    );
    for (index, chunk) in plan.iter().enumerate() {
        let via = chunk
            .proxy
            .as_ref()
            .map_or("direct".to_string(), |p| p.to_string());
        println!(
            "  chunk {}/{} [{}] via {}: {}",
            index + 1,
            plan.len(),
            chunk.usernames.len(),
            via,
            chunk.usernames.join(", ")
        );
    }
    Ok(())
}
