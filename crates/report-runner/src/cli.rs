use clap::{Parser, Subcommand};
use rr_config::{DEFAULT_CONFIG_FILE, RunOverrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rr")]
#[command(about = "Report Runner: chunked, rate-limit aware dispatch over an identity pool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Values that override the config file for a single invocation.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Identifier every submission targets
    #[arg(long)]
    pub target_id: Option<String>,

    /// Number of reports to complete (sent + failed)
    #[arg(long)]
    pub count: Option<usize>,
}

impl From<OverrideArgs> for RunOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            target_id: args.target_id,
            report_count: args.count,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work through the eligible identities chunk by chunk
    Run {
        #[command(flatten)]
        overrides: OverrideArgs,

        /// Simulated service latency for the built-in loopback backend
        #[arg(long, default_value_t = 250)]
        loopback_latency_ms: u64,
    },

    /// Show which identities would run in which chunk, without contacting anything
    Plan {
        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Inspect the identity pool
    Pool {
        #[command(subcommand)]
        cmd: PoolCommands,
    },
}

#[derive(Subcommand)]
pub enum PoolCommands {
    /// Count identities by eligibility bucket
    Status,
}
