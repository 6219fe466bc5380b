//! Maintenance gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │              MAINTENANCE GATEWAY              │
//!   Client Request       │  ┌─────────┐   ┌─────────────┐   in scope    │
//!   ─────────────────────┼─▶│  http   │──▶│ maintenance │──────────┐    │
//!                        │  │ server  │   │    layer    │          │    │
//!                        │  └─────────┘   └──────┬──────┘          ▼    │
//!                        │                out of │ scope    ┌──────────┐│
//!                        │                       ▼          │ 503 page ││
//!                        │                ┌─────────────┐   │ or text  ││
//!   Client Response      │                │  upstream   │   └──────────┘│
//!   ◀────────────────────┼────────────────│  forwarder  │◀──────────────┼──── Upstream
//!                        │                └─────────────┘               │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use maintenance_response::config::{load_config, ConfigWatcher, GatewayConfig};
use maintenance_response::lifecycle::{signals, Shutdown};
use maintenance_response::observability::{logging, metrics};
use maintenance_response::HttpServer;

#[derive(Parser)]
#[command(name = "maintenance-gateway")]
#[command(about = "Reverse proxy answering with maintenance pages while maintenance is enabled", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("maintenance-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        maintenance_enabled = config.maintenance.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher stops when dropped, keep it for the lifetime of main.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    signals::shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
