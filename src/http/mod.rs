//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID)
//!     → maintenance layer (503 page, 503 fallback, or continue)
//!     → upstream.rs (forward to the upstream service)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
pub use upstream::Upstream;
