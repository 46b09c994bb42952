//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by route and status
//! - `edge_request_duration_seconds` (histogram): latency by route
//! - `edge_render_fallbacks_total` (counter): static misses rendered on the server
//! - `edge_incomplete_responses_total` (counter): responses force-closed by the guard
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality: route label and status code only

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("edge_requests_total", "route" => route, "status" => status).increment(1);
    metrics::histogram!("edge_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a static miss that fell through to rendering.
pub fn record_render_fallback() {
    metrics::counter!("edge_render_fallbacks_total").increment(1);
}

/// Record a response the completion guard had to close.
pub fn record_incomplete_response(route: &'static str) {
    metrics::counter!("edge_incomplete_responses_total", "route" => route).increment(1);
}
