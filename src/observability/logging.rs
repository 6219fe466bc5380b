//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Configure log level from config, overridable with `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directives for a log level.
pub fn default_directives(level: &str) -> String {
    format!(
        "maintenance_response={level},maintenance_gateway={level},tower_http={level}",
        level = level
    )
}

/// Install the global subscriber. Must be called once, at startup.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(&config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
