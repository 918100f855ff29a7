//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nano_rpc_requests_total` (counter): RPC calls by action, outcome
//! - `nano_rpc_request_duration_seconds` (histogram): RPC latency by action
//! - `nano_send_total` (counter): send pipeline runs by outcome
//! - `nano_tool_calls_total` (counter): tool invocations by tool, outcome

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_call(action: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "nano_rpc_requests_total",
        "action" => action.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "nano_rpc_request_duration_seconds",
        "action" => action.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_send(outcome: &'static str) {
    metrics::counter!("nano_send_total", "outcome" => outcome).increment(1);
}

pub fn record_tool_call(tool: &'static str, outcome: &'static str) {
    metrics::counter!("nano_tool_calls_total", "tool" => tool, "outcome" => outcome).increment(1);
}
