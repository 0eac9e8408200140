//! # Feegate
//!
//! Main entry point for the feegate proxy.
//!
//! Feegate sits between user wallets and an execution node: it intercepts
//! `eth_sendRawTransaction`, holds the signed transaction in memory, and only
//! forwards it once its fee caps clear the network gas price. Until then the
//! transaction can be withdrawn or replaced at no on-chain cost. Every other
//! JSON-RPC method passes through to the upstream node untouched.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use feegate_client::{EthClient, GasMonitor, DEFAULT_MONITOR_PERIOD};
use feegate_config::Config;
use feegate_rpc::AppState;
use feegate_store::TxStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Feegate proxy
#[derive(Parser, Debug)]
#[command(name = "feegate")]
#[command(version)]
#[command(about = "JSON-RPC proxy that defers transaction broadcast until gas is affordable")]
struct Cli {
    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Gas monitor period in seconds
    #[arg(long, default_value_t = DEFAULT_MONITOR_PERIOD.as_secs())]
    monitor_period: u64,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(&cli, config.log_level());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        network = config.network(),
        "starting feegate"
    );

    let store = Arc::new(TxStore::new());
    let client = Arc::new(
        EthClient::new(config.upstream_url()).context("failed to build upstream client")?,
    );

    let cancel = CancellationToken::new();

    let monitor = GasMonitor::new(
        client.clone(),
        store.clone(),
        Duration::from_secs(cli.monitor_period),
    );
    let monitor_handle = tokio::spawn(monitor.run(cancel.clone()));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => info!("shutdown signal received"),
            Err(err) => error!(error = %err, "failed to listen for shutdown signals"),
        }
        shutdown.cancel();
    });

    let state = Arc::new(AppState { store, client });
    feegate_rpc::serve(&config.listen_addr(), state, cancel.clone())
        .await
        .context("JSON-RPC server failed")?;

    // The server has drained; stop the monitor as well before exiting.
    cancel.cancel();
    monitor_handle.await.ok();
    info!("feegate stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result,
            _ = term.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await
    }
}

/// Initializes tracing with the configured format and level.
///
/// `RUST_LOG` takes precedence over the `LOG_LEVEL` environment variable
/// when set.
fn init_tracing(cli: &Cli, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match cli.log_format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
    }
}
