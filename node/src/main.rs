// Copyright (c) 2026 SavingVault Contributors. MIT License.
// See LICENSE for details.

//! # SavingVault Node
//!
//! Entry point for the `saving-node` binary. Parses CLI arguments, initializes
//! logging and metrics, opens the ledger, and serves the REST/JSON-RPC API.
//!
//! The binary supports three subcommands:
//!
//! - `run`    : open the ledger and serve the API
//! - `init`   : create a data directory with an empty ledger
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use saving_vault::config::ENGINE_VERSION;
use saving_vault::{Clock, SystemClock, VaultDB, VaultEngine};

use cli::{Commands, SavingNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SavingNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens (or creates) the sled ledger under `data_dir/db`.
fn open_ledger(data_dir: &Path) -> Result<VaultDB> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let db = VaultDB::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), plans = db.plan_count(), "ledger opened");
    Ok(db)
}

/// Starts the node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "saving_node=info,saving_vault=info,tower_http=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting saving-node"
    );

    let db = open_ledger(&args.data_dir)?;
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let engine = Arc::new(Mutex::new(VaultEngine::with_clock(db, clock)));

    let node_metrics =
        Arc::new(NodeMetrics::new().context("failed to register prometheus metrics")?);

    let app_state = api::AppState {
        version: format!(
            "{} (engine {})",
            env!("CARGO_PKG_VERSION"),
            ENGINE_VERSION,
        ),
        engine: Arc::clone(&engine),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    engine
        .lock()
        .store()
        .flush()
        .context("failed to flush ledger on shutdown")?;
    tracing::info!("saving-node stopped");
    Ok(())
}

/// Initializes a data directory with an empty ledger.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("saving_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing node");

    let db = open_ledger(data_dir)?;
    db.flush().context("failed to flush new ledger")?;

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Ledger         : {}", data_dir.join("db").display());
    println!("  Plans          : {}", db.plan_count());

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("saving-node {}", env!("CARGO_PKG_VERSION"));
    println!("engine      {}", ENGINE_VERSION);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
