//! Metrics collection and exposition.
//!
//! # Metrics
//! - `adapter_requests_total` (counter): requests by method, status
//! - `adapter_request_duration_seconds` (histogram): latency distribution
//! - `adapter_version_decisions_total` (counter): filter outcomes by strategy
//! - `adapter_version_filter_misconfigured_total` (counter): deferrals with no
//!   continuation

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::versioning::Decision;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("adapter_requests_total", &labels).increment(1);
    metrics::histogram!("adapter_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record one version filter evaluation.
pub fn record_version_decision(strategy: &'static str, decision: Decision) {
    metrics::counter!(
        "adapter_version_decisions_total",
        "strategy" => strategy,
        "decision" => decision.as_str()
    )
    .increment(1);
}

/// Record a filter that had to defer without a continuation.
pub fn record_filter_misconfigured(strategy: &'static str) {
    metrics::counter!(
        "adapter_version_filter_misconfigured_total",
        "strategy" => strategy
    )
    .increment(1);
}
