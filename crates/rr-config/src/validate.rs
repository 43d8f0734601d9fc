use anyhow::Result;
use rr_core::AppError;

use crate::config::RunConfig;

/// Validate a loaded run configuration (after command-line overrides).
/// Returns Ok(()) if valid, or `AppError::InvalidConfig` describing the first problem.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    validate_target(config)?;
    validate_chunks(config)?;
    validate_proxies(config)?;
    Ok(())
}

fn invalid(message: String) -> anyhow::Error {
    AppError::InvalidConfig(message).into()
}

fn validate_target(config: &RunConfig) -> Result<()> {
    if config.target_id.trim().is_empty() {
        return Err(invalid(
            "target_id cannot be empty (set it in the config or pass --target-id)".to_string(),
        ));
    }
    if config.report_count == 0 {
        return Err(invalid("report_count must be > 0 (got 0)".to_string()));
    }
    Ok(())
}

fn validate_chunks(config: &RunConfig) -> Result<()> {
    if config.chunks.size == 0 {
        return Err(invalid("chunks.size must be > 0 (got 0)".to_string()));
    }
    if config.chunks.switch_proxy_every == 0 {
        return Err(invalid(
            "chunks.switch_proxy_every must be > 0 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_proxies(config: &RunConfig) -> Result<()> {
    if let Some(pos) = config
        .proxies
        .iter()
        .position(|p| p.as_str().trim().is_empty())
    {
        return Err(invalid(format!("proxies[{pos}] is blank")));
    }
    Ok(())
}
