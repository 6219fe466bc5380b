//! Maintenance mode for HTTP services.
//!
//! A tower layer that answers requests with `503 Service Unavailable` while
//! maintenance is enabled, picking the maintenance page that best matches
//! the client's `Accept` header. Host filters limit which requests are
//! affected; everything else reaches the wrapped service unchanged.
//!
//! The crate also provides the `maintenance-gateway` binary, a reverse proxy
//! to a single upstream with the layer applied.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod maintenance;
pub mod observability;

pub use config::{GatewayConfig, MaintenanceConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use maintenance::{Maintenance, MaintenanceHandle, MaintenanceLayer};
