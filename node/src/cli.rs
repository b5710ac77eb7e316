//! # CLI Interface
//!
//! Defines the command-line argument structure for `saving-node` using
//! `clap` derive. Supports three subcommands: `run`, `init`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use saving_vault::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

/// SavingVault node.
///
/// Hosts the savings-plan engine over a durable ledger, serves the REST and
/// JSON-RPC API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "saving-node",
    about = "SavingVault savings-plan node",
    version,
    propagate_version = true
)]
pub struct SavingNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Initialize a data directory and create an empty ledger.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the ledger database. Created on first run.
    #[arg(long, short = 'd', env = "SAVING_DATA_DIR", default_value = ".saving-vault")]
    pub data_dir: PathBuf,

    /// Port for the REST and JSON-RPC API.
    #[arg(long, env = "SAVING_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "SAVING_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "SAVING_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "SAVING_DATA_DIR", default_value = ".saving-vault")]
    pub data_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        SavingNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = SavingNodeCli::try_parse_from(["saving-node", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.api_port, DEFAULT_API_PORT);
                assert_eq!(args.metrics_port, DEFAULT_METRICS_PORT);
                assert_eq!(args.log_format, "pretty");
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn run_overrides() {
        let cli = SavingNodeCli::try_parse_from([
            "saving-node",
            "run",
            "-d",
            "/tmp/ledger",
            "--api-port",
            "8000",
            "--log-format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.data_dir, PathBuf::from("/tmp/ledger"));
                assert_eq!(args.api_port, 8000);
                assert_eq!(args.log_format, "json");
            }
            other => panic!("expected run, got {other:?}"),
        }
    }
}
