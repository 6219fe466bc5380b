//! Per-request maintenance decisions and responses.
//!
//! # Data Flow
//! ```text
//! Request
//!     → CHECK_FILTER (filter.rs)   ── out of scope ──▶ PASSTHROUGH (next service)
//!     → NEGOTIATE (negotiate.rs)   ── empty catalog / no match ──▶ FALLBACK
//!     → SERVE_FILE                 ── open failed ──▶ FALLBACK
//! ```
//!
//! # Design Decisions
//! - No state survives a request; catalog and filters are shared read-only
//! - The file is opened before headers are committed, so a missing file still
//!   yields the fallback; a read error after that truncates the body
//! - The file handle lives inside the body stream and is closed when the
//!   stream finishes or is dropped (client disconnect included)

use std::io;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
};
use thiserror::Error;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::config::MaintenanceConfig;
use crate::maintenance::catalog::{Catalog, CatalogEntry, CatalogError};
use crate::maintenance::filter::FilterSet;
use crate::maintenance::negotiate::negotiate;
use crate::observability::metrics;

/// Status code of every maintenance response.
pub const MAINTENANCE_STATUS: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// Body of the fallback response.
pub const FALLBACK_BODY: &str = "Service is in maintenance mode";

/// Content type of the fallback response.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Why no dispatcher was built. Either way requests pass through untouched.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("maintenance mode is disabled")]
    Disabled,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// What to do with a single request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Out of scope: hand the request to the next service.
    Passthrough,
    /// Serve this maintenance page with [`serve_page`].
    Serve(CatalogEntry),
    /// Serve the plain-text fallback with [`serve_fallback`].
    Fallback,
}

/// The maintenance dispatcher: a read-only catalog plus host filters.
#[derive(Debug, Clone)]
pub struct Maintenance {
    catalog: Catalog,
    filters: FilterSet,
}

impl Maintenance {
    pub fn new(catalog: Catalog, filters: FilterSet) -> Self {
        metrics::record_catalog_size(catalog.len());
        Self { catalog, filters }
    }

    /// Build from configuration.
    ///
    /// Fails when maintenance is disabled or a content pattern is malformed;
    /// callers must then leave traffic untouched.
    pub fn from_config(config: &MaintenanceConfig) -> Result<Self, BuildError> {
        if !config.enabled {
            return Err(BuildError::Disabled);
        }
        let catalog = Catalog::build(&config.content)?;
        let filters = FilterSet::new(&config.query_filter);

        if catalog.is_empty() {
            tracing::warn!("No maintenance pages available, serving the plain-text fallback");
        }
        if filters.is_empty() {
            tracing::info!("Maintenance mode enabled for all requests");
        } else {
            tracing::info!(filters = filters.filters().len(), "Maintenance mode enabled for filtered hosts");
        }

        Ok(Self::new(catalog, filters))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Run the filter check and negotiation for `req`.
    pub fn decide<B>(&self, req: &Request<B>) -> Decision {
        if !self.filters.in_scope(req) {
            tracing::debug!(uri = %req.uri(), "Request out of maintenance scope");
            return Decision::Passthrough;
        }
        if self.catalog.is_empty() {
            return Decision::Fallback;
        }

        let accept = match req.headers().get(header::ACCEPT).map(|v| v.to_str()) {
            None => None,
            Some(Ok(value)) => Some(value),
            Some(Err(_)) => {
                tracing::debug!("Accept header is not valid ASCII");
                return Decision::Fallback;
            }
        };

        match negotiate(accept, &self.catalog) {
            Ok(entry) => Decision::Serve(entry.clone()),
            Err(e) => {
                tracing::debug!(error = %e, "Content negotiation failed");
                Decision::Fallback
            }
        }
    }
}

/// Stream `entry`, or the fallback if it cannot be opened.
pub async fn serve_page(entry: CatalogEntry) -> Response {
    match file_response(&entry).await {
        Ok(response) => {
            metrics::record_maintenance_response("file");
            response
        }
        Err(e) => {
            tracing::error!(path = ?entry.path, error = %e, "Failed to open maintenance page");
            serve_fallback()
        }
    }
}

/// The fallback response, counted as such.
pub fn serve_fallback() -> Response {
    metrics::record_maintenance_response("fallback");
    fallback_response()
}

/// The fixed plain-text maintenance response.
pub fn fallback_response() -> Response {
    let mut response = Response::new(Body::from(FALLBACK_BODY));
    *response.status_mut() = MAINTENANCE_STATUS;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(FALLBACK_CONTENT_TYPE),
    );
    response
}

/// Stream a catalog entry with its media type and the maintenance status.
pub async fn file_response(entry: &CatalogEntry) -> io::Result<Response> {
    let content_type = HeaderValue::from_str(&entry.media_type.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let file = File::open(&entry.path).await?;

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = MAINTENANCE_STATUS;
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}
