//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define edge metrics (request counts, latency, backend health)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status, backend
//! - `edge_request_duration_seconds` (histogram): latency distribution
//! - `edge_backend_health` (gauge): 1=alive, 0=dead, per backend
//!
//! # Design Decisions
//! - Metric updates are atomic increments, safe on the hot path
//! - The exporter failing to bind logs an error but never aborts the
//!   proxy; serving traffic wins over serving metrics

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
/// Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, backend: &str, start_time: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("backend", backend.to_string()),
    ];
    counter!("edge_requests_total", &labels).increment(1);
    histogram!("edge_request_duration_seconds", &labels)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a backend liveness verdict.
pub fn record_backend_health(backend: &str, alive: bool) {
    gauge!("edge_backend_health", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}
