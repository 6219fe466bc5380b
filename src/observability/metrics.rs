//! Metrics collection and exposition.
//!
//! # Metrics
//! - `maintenance_responses_total` (counter): maintenance responses by outcome (`file`, `fallback`)
//! - `maintenance_passthrough_total` (counter): requests outside maintenance scope
//! - `maintenance_catalog_entries` (gauge): pages in the active catalog
//! - `gateway_upstream_requests_total` (counter): upstream responses by status

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_maintenance_response(outcome: &'static str) {
    counter!("maintenance_responses_total", "outcome" => outcome).increment(1);
}

pub fn record_passthrough() {
    counter!("maintenance_passthrough_total").increment(1);
}

pub fn record_catalog_size(entries: usize) {
    gauge!("maintenance_catalog_entries").set(entries as f64);
}

pub fn record_upstream(status: u16) {
    counter!("gateway_upstream_requests_total", "status" => status.to_string()).increment(1);
}
