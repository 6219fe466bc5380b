//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses (listener, upstream, metrics)
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Maintenance content is not validated: a bad pattern degrades to
//!   pass-through at runtime instead of blocking startup

use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address {0:?}")]
    BindAddress(String),

    #[error("invalid upstream address {0:?}")]
    UpstreamAddress(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream = &config.upstream.address;
    if upstream.is_empty() || upstream.parse::<Authority>().is_err() {
        errors.push(ValidationError::UpstreamAddress(upstream.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
