//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router forwarding to the upstream
//! - Wire up middleware (tracing, request ID, timeout, maintenance)
//! - Bind server to listener
//! - Apply configuration updates to the maintenance layer
//! - Graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::upstream::{upstream_handler, Upstream};
use crate::lifecycle::ShutdownSignal;
use crate::maintenance::{MaintenanceHandle, MaintenanceLayer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<Upstream>,
}

/// HTTP server for the maintenance gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    maintenance: MaintenanceHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let maintenance = MaintenanceHandle::from_config(&config.maintenance);
        let state = AppState {
            upstream: Arc::new(Upstream::new(&config.upstream, &config.timeouts)),
        };

        let router = Self::build_router(&config, state, maintenance.clone());
        Self {
            router,
            config,
            maintenance,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, maintenance: MaintenanceHandle) -> Router {
        Router::new()
            .fallback(upstream_handler)
            .with_state(state)
            .layer(MaintenanceLayer::with_handle(maintenance))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Every configuration received on `config_updates` rebuilds the
    /// maintenance dispatcher. The server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            maintenance = self.maintenance.is_active(),
            "HTTP server starting"
        );

        let handle = self.maintenance.clone();
        let mut current = self.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                reload(&handle, &current, &new_config).await;
                current = new_config;
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Handle to the active maintenance dispatcher.
    pub fn maintenance(&self) -> &MaintenanceHandle {
        &self.maintenance
    }

    /// The fully layered router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn reload(handle: &MaintenanceHandle, current: &GatewayConfig, new_config: &GatewayConfig) {
    if new_config.listener != current.listener
        || new_config.upstream != current.upstream
        || new_config.timeouts != current.timeouts
    {
        tracing::warn!("Listener, upstream and timeout changes take effect after a restart");
    }

    // Catalog construction touches the filesystem.
    let handle = handle.clone();
    let maintenance = new_config.maintenance.clone();
    match tokio::task::spawn_blocking(move || handle.apply(&maintenance)).await {
        Ok(()) => tracing::info!(enabled = new_config.maintenance.enabled, "Maintenance configuration reloaded"),
        Err(e) => tracing::error!(error = %e, "Maintenance reload task failed"),
    }
}
