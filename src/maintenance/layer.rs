//! Tower integration for the maintenance dispatcher.
//!
//! # Responsibilities
//! - Wrap any inner service (the "next handler")
//! - Answer in-scope requests with maintenance responses
//! - Forward everything else to the inner service unchanged
//!
//! # Design Decisions
//! - The active dispatcher sits behind an `ArcSwapOption`; `None` = pass-through
//! - Reloads replace the whole dispatcher, requests never see a partial update
//! - Request handling never takes a lock

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwapOption;
use axum::{body::Body, http::Request, response::Response};
use tower::{Layer, Service};

use crate::config::MaintenanceConfig;
use crate::maintenance::dispatcher::{serve_fallback, serve_page, BuildError, Decision, Maintenance};
use crate::observability::metrics;

/// Shared, swappable reference to the active dispatcher.
#[derive(Clone, Default)]
pub struct MaintenanceHandle {
    current: Arc<ArcSwapOption<Maintenance>>,
}

impl MaintenanceHandle {
    /// A handle that passes every request through.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MaintenanceConfig) -> Self {
        let handle = Self::new();
        handle.apply(config);
        handle
    }

    /// Rebuild the dispatcher from `config` and swap it in.
    ///
    /// A disabled config or a malformed content pattern installs pass-through.
    pub fn apply(&self, config: &MaintenanceConfig) {
        match Maintenance::from_config(config) {
            Ok(maintenance) => self.set(Some(maintenance)),
            Err(BuildError::Disabled) => {
                tracing::info!("Maintenance mode disabled");
                metrics::record_catalog_size(0);
                self.set(None);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build maintenance catalog, passing requests through");
                metrics::record_catalog_size(0);
                self.set(None);
            }
        }
    }

    pub fn set(&self, maintenance: Option<Maintenance>) {
        self.current.store(maintenance.map(Arc::new));
    }

    pub fn current(&self) -> Option<Arc<Maintenance>> {
        self.current.load_full()
    }

    pub fn is_active(&self) -> bool {
        self.current.load().is_some()
    }
}

/// Layer that applies [`MaintenanceService`].
#[derive(Clone)]
pub struct MaintenanceLayer {
    handle: MaintenanceHandle,
}

impl MaintenanceLayer {
    pub fn new(config: &MaintenanceConfig) -> Self {
        Self::with_handle(MaintenanceHandle::from_config(config))
    }

    pub fn with_handle(handle: MaintenanceHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &MaintenanceHandle {
        &self.handle
    }
}

impl<S> Layer<S> for MaintenanceLayer {
    type Service = MaintenanceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MaintenanceService {
            inner,
            handle: self.handle.clone(),
        }
    }
}

/// Service answering in-scope requests with maintenance responses.
#[derive(Clone)]
pub struct MaintenanceService<S> {
    inner: S,
    handle: MaintenanceHandle,
}

impl<S> Service<Request<Body>> for MaintenanceService<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let Some(maintenance) = self.handle.current() else {
            return Box::pin(self.inner.call(req));
        };

        match maintenance.decide(&req) {
            Decision::Passthrough => {
                metrics::record_passthrough();
                Box::pin(self.inner.call(req))
            }
            Decision::Serve(entry) => Box::pin(async move { Ok(serve_page(entry).await) }),
            Decision::Fallback => {
                let response = serve_fallback();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
