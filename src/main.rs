//! Nano wallet tool server.
//!
//! ```text
//!   tool caller ──HTTP──▶ http::server ──▶ tools::NanoTools
//!                                              │
//!                          ┌───────────────────┼────────────────────┐
//!                          ▼                   ▼                    ▼
//!                  account_info /        send pipeline         work_generate
//!                  block_info        (lock, build, sign,      (NANO_WORK_
//!                  (NANO_RPC_URL)     process)                 GENERATION_URL)
//! ```
//!
//! Configuration comes from an optional TOML file plus `NANO_*` environment
//! variables. Invalid configuration exits with a non-zero status before any
//! request is served.

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

use nano_wallet::blockchain::SendLimits;
use nano_wallet::config::watcher::{apply_hot_changes, restart_required, ConfigWatcher};
use nano_wallet::config::{load_config, load_from_env, NanoConfig};
use nano_wallet::http::HttpServer;
use nano_wallet::lifecycle::{termination_signal, Shutdown};
use nano_wallet::observability::{logging, metrics};
use nano_wallet::tools::NanoTools;

#[derive(Parser)]
#[command(name = "nano-wallet", version)]
#[command(about = "Nano wallet tools over HTTP", long_about = None)]
struct Args {
    /// TOML configuration file; enables hot reload of the send limit.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nano-wallet starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let tools = match NanoTools::from_config(&config) {
        Ok(tools) => Arc::new(tools),
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        rpc_timeout_secs = config.node.rpc_timeout_secs,
        work_timeout_secs = config.node.work_timeout_secs,
        max_send_amount = %config.wallet.max_send_amount,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();

    // Dropping the watcher handle stops file notifications.
    let _watcher = match &args.config {
        Some(path) => match watch_config(path, config.clone(), tools.clone(), &shutdown) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable, send limit is fixed");
                None
            }
        },
        None => None,
    };

    let listener = match TcpListener::bind(&config.server.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.server.bind_address, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        termination_signal().await;
        trigger.trigger();
    });

    if let Err(e) = HttpServer::new(tools).run(listener, &shutdown).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// Apply validated file changes to the running pipeline until shutdown.
fn watch_config(
    path: &Path,
    mut current: NanoConfig,
    tools: Arc<NanoTools>,
    shutdown: &Shutdown,
) -> Result<notify::RecommendedWatcher, notify::Error> {
    let (watcher, mut updates) = ConfigWatcher::new(path);
    let handle = watcher.run()?;
    let mut stop = shutdown.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(next) = updates.recv() => {
                    for section in restart_required(&current, &next) {
                        tracing::warn!(section = section, "Changed setting needs a restart to take effect");
                    }
                    if let Some(max_send_amount) = apply_hot_changes(&mut current, &next) {
                        match SendLimits::from_nano(&max_send_amount) {
                            Ok(limits) => tools.pipeline().set_limits(limits),
                            Err(e) => tracing::error!(error = %e, "Ignoring invalid max_send_amount"),
                        }
                    }
                }
                _ = stop.recv() => break,
                else => break,
            }
        }
        tracing::debug!("Config reload task stopped");
    });

    Ok(handle)
}
