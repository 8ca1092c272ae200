//! CLI for the connretry connection retry controller.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use connretry_core::config::{self, ConnretryConfig};
use std::path::PathBuf;

use commands::{run_classify, run_config, run_simulate};

/// Top-level CLI for connretry.
#[derive(Debug, Parser)]
#[command(name = "connretry")]
#[command(about = "connretry: connection retry controller with transient error classification", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/connretry/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the retry controller against a scripted connector and print its events.
    Simulate(SimulateArgs),

    /// Report whether each error code is treated as transient.
    Classify {
        /// Server error codes to classify.
        #[arg(required = true)]
        codes: Vec<u32>,
    },

    /// Print the effective configuration.
    Config,
}

/// Script and policy overrides for `connretry simulate`.
#[derive(Debug, Clone, Default, Args)]
pub struct SimulateArgs {
    /// Fail an attempt with this error code (repeat for consecutive attempts).
    #[arg(long = "fail", value_name = "CODE")]
    pub fail: Vec<u32>,

    /// After the scripted failures, the next attempt succeeds.
    #[arg(long, conflicts_with = "hang")]
    pub then_succeed: bool,

    /// After the scripted failures, the next attempt never completes.
    #[arg(long)]
    pub hang: bool,

    /// Simulated duration of every attempt in milliseconds.
    #[arg(long, default_value = "0", value_name = "MS")]
    pub latency_ms: u64,

    /// Override [retry] max_retries.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Override [retry] retry_interval_ms.
    #[arg(long, value_name = "MS")]
    pub retry_interval_ms: Option<u64>,

    /// Override [retry] connect_timeout_ms.
    #[arg(long, value_name = "MS", conflicts_with = "no_timeout")]
    pub connect_timeout_ms: Option<u64>,

    /// Disable the overall connect timeout.
    #[arg(long)]
    pub no_timeout: bool,

    /// Treat this code as transient in addition to the configured table (repeatable).
    #[arg(long = "transient", value_name = "CODE")]
    pub transient: Vec<u32>,

    /// Print events as JSON lines.
    #[arg(long)]
    pub json: bool,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Simulate(args) => run_simulate(&cfg, &args).await?,
            CliCommand::Classify { codes } => run_classify(&cfg, &codes)?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ConnretryConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

#[cfg(test)]
mod tests;
