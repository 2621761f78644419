//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, failovers, backend liveness)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, backend
//! - `proxy_request_duration_seconds` (histogram): latency including failover
//! - `proxy_backend_health` (gauge): 1=alive, 0=dead
//! - `proxy_local_retries_total` (counter): retries against the same backend
//! - `proxy_failovers_total` (counter): backends marked dead by the dispatcher
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let backend = backend.to_string();
    counter!(
        "proxy_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "backend" => backend.clone()
    )
    .increment(1);
    histogram!(
        "proxy_request_duration_seconds",
        "method" => method,
        "status" => status,
        "backend" => backend
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the liveness of a backend.
pub fn record_backend_health(backend: &str, alive: bool) {
    gauge!("proxy_backend_health", "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}

pub fn record_local_retry(backend: &str) {
    counter!("proxy_local_retries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_failover(backend: &str) {
    counter!("proxy_failovers_total", "backend" => backend.to_string()).increment(1);
}
