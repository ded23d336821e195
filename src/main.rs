//! Waitlist signup service.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /api/waitlist
//!     ───────────────────▶ ┌──────────┐    ┌────────────────────────────────────────┐
//!                          │   http   │───▶│            WaitlistService              │
//!     ◀─────────────────── │  server  │◀───│ validate → client ip → hash → limit →   │
//!     ActionResult JSON    └──────────┘    │ insert → classify                       │
//!                                          └───────────────┬────────────────────────┘
//!                                                          │ count_since / insert
//!                                                          ▼
//!                                              ┌───────────────────────┐
//!                                              │ storage (memory/sqlite)│
//!                                              └───────────────────────┘
//!
//!     Cross-cutting: config (+ hot reload), observability, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use waitlist_service::config::{load_config, ConfigWatcher, WaitlistConfig};
use waitlist_service::http::HttpServer;
use waitlist_service::lifecycle::{
    open_store, spawn_policy_reloader, wait_for_shutdown_signal, Shutdown, StartupError,
};
use waitlist_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "waitlist-service")]
#[command(about = "Waitlist signup API", version)]
struct Args {
    /// Path to a TOML config file. Watched for rate-limit changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WaitlistConfig::default(),
    };

    logging::init_logging(&config.observability);
    run(config, args.config).await?;
    Ok(())
}

async fn run(config: WaitlistConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    tracing::info!("waitlist-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        storage = ?config.storage.backend,
        rate_limit_enabled = config.rate_limit.enabled,
        max_submissions = config.rate_limit.max_submissions,
        window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let store = open_store(&config.storage).await?;
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config.clone(), store);

    // Dropping the watcher stops it, so it lives until `run` returns.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, policies) = ConfigWatcher::new(&path, config.clone());
            spawn_policy_reloader(server.service(), policies, shutdown.subscribe());
            Some(watcher.run()?)
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
