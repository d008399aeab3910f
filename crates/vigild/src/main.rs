//! vigild — the Vigil status daemon.
//!
//! Single binary that assembles the subsystems:
//! - Probe registry (fixed at startup from the config document)
//! - Snapshot aggregator + refresh scheduler + cache
//! - HTTP API
//!
//! The first refresh completes before the listener binds, so a served
//! 503 only ever means the process just started.
//!
//! # Usage
//!
//! ```text
//! vigild --config /etc/vigil.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use vigil_api::ApiState;
use vigil_core::Config;
use vigil_snapshot::{Aggregator, Refresher, SnapshotCache};

#[derive(Parser)]
#[command(name = "vigild", about = "Vigil status daemon")]
struct Cli {
    /// Path to the config document.
    #[arg(long, default_value = "vigil.json")]
    config: PathBuf,

    /// Listening port; overrides the config document.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vigild=debug,vigil=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // A broken config is fatal; the process exits non-zero.
    let config = Config::from_file(&cli.config)?;
    let port = cli
        .port
        .or(config.port)
        .unwrap_or(vigil_core::config::DEFAULT_PORT);

    run(config, port).await
}

async fn run(config: Config, port: u16) -> anyhow::Result<()> {
    let started_at = Instant::now();
    let name = config.name.clone().unwrap_or_else(|| "vigil".to_string());
    let refresh_period = config.refresh_period();

    // ── Probe registry ─────────────────────────────────────────
    let probes = vigil_probes::registry(&config, started_at)?;
    info!(probes = probes.len(), "probe registry built");

    // ── Snapshot core ──────────────────────────────────────────
    let cache = SnapshotCache::new();
    let refresher = Refresher::new(Aggregator::new(probes), cache.clone(), refresh_period);

    // Cold start: complete one refresh before accepting traffic.
    refresher.refresh_once().await;
    info!("initial snapshot ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = tokio::spawn({
        let refresher = refresher.clone();
        async move { refresher.run(shutdown_rx).await }
    });

    // ── HTTP surface ───────────────────────────────────────────
    let state = ApiState::new(cache, started_at, refresh_period);
    let router = vigil_api::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, name = %name, "status API listening");
    info!(
        period_ms = refresh_period.as_millis() as u64,
        "background refresh enabled"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = refresh_handle.await;
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
}
