use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod loopback;
mod plan_cmd;
mod pool_cmd;
mod run_cmd;

use cli::{Cli, Commands, PoolCommands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (output to stderr, initialize only once)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .try_init()
        .ok();

    match cli.command {
        Commands::Run {
            overrides,
            loopback_latency_ms,
        } => {
            run_cmd::handle_run(&cli.config, overrides.into(), loopback_latency_ms).await?;
        }
        Commands::Plan { overrides } => {
            plan_cmd::handle_plan(&cli.config, overrides.into())?;
        }
        Commands::Pool { cmd } => match cmd {
            PoolCommands::Status => {
                pool_cmd::handle_pool_status(&cli.config)?;
            }
        },
    }

    Ok(())
}
