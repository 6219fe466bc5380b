//! Maintenance mode subsystem.
//!
//! # Data Flow
//! ```text
//! MaintenanceConfig (enabled, content globs, host filters)
//!     → catalog.rs (glob + extension/sniff → MIME → file)
//!     → filter.rs (host filters)
//!     → dispatcher.rs (Maintenance, immutable)
//!     → layer.rs (tower Layer, swappable handle)
//!
//! Per request:
//!     layer.rs → dispatcher.rs (filter check, negotiate.rs)
//!     → 503 file | 503 fallback | next service
//! ```
//!
//! # Design Decisions
//! - Construction problems degrade to pass-through or fallback, never to errors
//! - Status code is a constant, not shared mutable state
//! - No caching of page contents; every served page is re-read from disk

pub mod catalog;
pub mod dispatcher;
pub mod filter;
pub mod layer;
pub mod media_type;
pub mod negotiate;
pub mod sniff;

pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use dispatcher::{
    serve_fallback, serve_page, Decision, Maintenance, FALLBACK_BODY, FALLBACK_CONTENT_TYPE,
    MAINTENANCE_STATUS,
};
pub use filter::{FilterSet, HostFilter};
pub use layer::{MaintenanceHandle, MaintenanceLayer, MaintenanceService};
pub use media_type::MediaType;
pub use negotiate::{AcceptHeader, NegotiationError};
