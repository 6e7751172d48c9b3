//! # MuSig Coordinator
//!
//! Entry point for the pending multi-signature transaction coordinator.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from `MUSIG_*` environment variables
//! 3. Load the snapshot and start the background tasks
//! 4. Wait for Ctrl+C, then shut down and persist

use anyhow::{Context, Result};
use musig_runtime::{CoordinatorRuntime, NodeConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    info!(
        mode = %config.network.mode,
        ledger = %config.network.ledger_host,
        data_dir = %config.storage.data_dir.display(),
        "Starting MuSig coordinator"
    );

    let mut runtime = CoordinatorRuntime::new(config)?;
    runtime.start();

    let status = runtime.handler().handle_status();
    info!(
        total = status.total,
        ready = status.ready,
        pending = status.pending,
        "Coordinator running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await?;
    Ok(())
}
