//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sos_frontend_startups_total` (counter): startup attempts by front end and outcome
//! - `sos_pool_rejections_total` (counter): submissions refused after shutdown began
//! - `sos_node_teardowns_total` (counter): node teardowns actually executed
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_startup(front_end: &'static str, success: bool) {
    let outcome = if success { "started" } else { "failed" };
    metrics::counter!(
        "sos_frontend_startups_total",
        "front_end" => front_end,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_pool_rejection() {
    metrics::counter!("sos_pool_rejections_total").increment(1);
}

pub fn record_node_teardown() {
    metrics::counter!("sos_node_teardowns_total").increment(1);
}
