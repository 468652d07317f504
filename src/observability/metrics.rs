//! Metrics collection and exposition.
//!
//! # Metrics
//! - `switchback_requests_total` (counter): requests by method, status
//! - `switchback_request_duration_seconds` (histogram): latency by method
//! - `switchback_not_found_total` (counter): requests no layer answered
//! - `switchback_unhandled_errors_total` (counter): errors that reached the app
//! - `switchback_dispatch_yields_total` (counter): scheduler yields in dispatch loops
//!
//! # Design Decisions
//! - The Prometheus exporter serves its own HTTP listener, separate from the app
//! - Recording before `init_metrics` is a silent no-op

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(err) => tracing::error!(address = %addr, error = %err, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    ::metrics::counter!(
        "switchback_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "switchback_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(elapsed);
}

pub fn record_not_found() {
    ::metrics::counter!("switchback_not_found_total").increment(1);
}

pub fn record_unhandled_error() {
    ::metrics::counter!("switchback_unhandled_errors_total").increment(1);
}

pub fn record_dispatch_yield() {
    ::metrics::counter!("switchback_dispatch_yields_total").increment(1);
}
