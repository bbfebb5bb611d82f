//! VERDE-OS - Hydroponic Crop Cycle Intelligence System
//!
//! Classifies a live feed of environmental sensor readings into growth-cycle
//! day numbers and stage labels, serving the result over a JSON API.
//!
//! # Usage
//!
//! ```bash
//! # Run with a synthetic demo snapshot
//! cargo run --release
//!
//! # Run with snapshot input from stdin
//! verde-sim | ./verde-os --stdin
//!
//! # Run with a CSV snapshot
//! ./verde-os --csv readings.csv
//! ```
//!
//! # Environment Variables
//!
//! - `VERDE_CONFIG`: Path to the deployment TOML (default: ./verde_config.toml)
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe the boundary store on startup (for testing)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use verde_os::api::{create_app, ApiState};
use verde_os::config::{self, CropConfig};
use verde_os::cycle::BoundaryLedger;
use verde_os::ingest;
use verde_os::pipeline::processing_loop::{PipelineOptions, ProcessingLoop};
use verde_os::pipeline::source::{CsvSource, ReadingSource, StdinSource};
use verde_os::pipeline::AppState;
use verde_os::storage::SledBoundaryStore;

#[derive(Parser, Debug)]
#[command(name = "verde-os")]
#[command(about = "VERDE-OS Hydroponic Crop Cycle Intelligence System")]
#[command(version)]
struct CliArgs {
    /// Read snapshots from stdin (one JSON array per line).
    /// Use with the simulator: verde-sim | ./verde-os --stdin
    #[arg(long)]
    stdin: bool,

    /// Classify a CSV snapshot instead of the built-in demo data
    #[arg(long, value_name = "PATH")]
    csv: Option<String>,

    /// Bind address override for the JSON API (default from config)
    #[arg(short, long)]
    addr: Option<String>,

    /// Wipe the persisted boundary configuration before starting.
    /// Destructive; RESET_DB=true in the environment does the same.
    #[arg(long)]
    reset_db: bool,
}

/// `--reset-db` on the command line, or RESET_DB=true/1/yes in the
/// environment.
fn reset_requested(args: &CliArgs) -> bool {
    args.reset_db
        || std::env::var("RESET_DB")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
}

/// Remove the data directory so a fresh boundary store is created on startup.
fn wipe_data_dir(data_dir: &str) -> Result<()> {
    let path = std::path::Path::new(data_dir);
    if !path.exists() {
        info!(dir = %path.display(), "No data directory to wipe");
        return Ok(());
    }
    warn!(dir = %path.display(), "Reset requested, removing persisted boundary configuration");
    std::fs::remove_dir_all(path)
        .with_context(|| format!("failed to remove {}", path.display()))?;
    Ok(())
}

/// Run the classification pipeline with any snapshot source.
///
/// All input modes (demo, CSV, stdin) converge here: open the boundary
/// store, bind the API, spawn both long-lived tasks into one `JoinSet`,
/// and let the first failure cancel the rest.
async fn run_pipeline<S: ReadingSource>(
    mut source: S,
    server_addr: String,
    cancel_token: CancellationToken,
) -> Result<()> {
    let cfg = config::get();

    let store = SledBoundaryStore::open(format!("{}/boundaries", cfg.storage.data_dir))
        .context("failed to open boundary store")?;
    let ledger = BoundaryLedger::new(Arc::new(store));
    let app_state = Arc::new(RwLock::new(AppState::default()));

    let app = create_app(ApiState::new(Arc::clone(&app_state), ledger.clone()));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("cannot bind {server_addr}"))?;
    info!(addr = %server_addr, "JSON API listening");

    let mut tasks: JoinSet<Result<&'static str>> = JoinSet::new();

    let http_cancel = cancel_token.clone();
    tasks.spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { http_cancel.cancelled().await })
            .await
            .context("HTTP server error")?;
        info!("[HttpServer] Stopped");
        Ok("HttpServer")
    });

    let options = PipelineOptions::from_config(cfg);
    let feed_cancel = cancel_token.clone();
    let feed_state = Arc::clone(&app_state);
    tasks.spawn(async move {
        let stats = ProcessingLoop::new(ledger, feed_state, options, feed_cancel)
            .run(&mut source)
            .await;
        info!(
            snapshots = stats.snapshots_processed,
            "[FeedProcessor] Stopped"
        );
        Ok("FeedProcessor")
    });

    supervise(&mut tasks, cancel_token).await
}

/// Drain the task set; a task error or panic cancels everything else and
/// propagates.
async fn supervise(
    tasks: &mut JoinSet<Result<&'static str>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(name)) => info!(task = name, "Task finished"),
            Ok(Err(e)) => {
                error!(error = %e, "Task failed, shutting down");
                cancel_token.cancel();
                return Err(e);
            }
            Err(e) => {
                error!(error = %e, "Task panicked, shutting down");
                cancel_token.cancel();
                return Err(anyhow::anyhow!("task panic: {e}"));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let crop_config = CropConfig::load();
    info!(
        crop = %crop_config.crop.name,
        policy = %crop_config.cycle.policy,
        "VERDE-OS Crop Cycle Intelligence System"
    );

    // Must happen before the sled store is opened.
    if reset_requested(&args) {
        wipe_data_dir(&crop_config.storage.data_dir)?;
    }

    let server_addr = args
        .addr
        .clone()
        .unwrap_or_else(|| crop_config.server.addr.clone());
    config::init(crop_config);

    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down");
            ctrlc_token.cancel();
        }
    });

    if args.stdin {
        info!("Input: stdin (JSON snapshots from simulator)");
        run_pipeline(StdinSource::new(), server_addr, cancel_token).await?;
    } else if let Some(path) = args.csv {
        info!(path = %path, "Input: CSV snapshot");
        let readings = ingest::read_csv_snapshot(&path);
        if readings.is_empty() {
            anyhow::bail!("no readings loaded from {path}");
        }
        run_pipeline(CsvSource::new(readings), server_addr, cancel_token).await?;
    } else {
        info!("Input: synthetic demo snapshot (full crop cycle)");
        run_pipeline(
            CsvSource::new(ingest::generate_demo_snapshot()),
            server_addr,
            cancel_token,
        )
        .await?;
    }

    info!("VERDE-OS shutdown complete");
    Ok(())
}
