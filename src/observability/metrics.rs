//! Metrics collection and exposition.
//!
//! # Metrics
//! - `connector_requests_total` (counter): finished calls by method, outcome
//! - `connector_request_duration_seconds` (histogram): latency by method
//! - `connector_requests_cancelled_total` (counter): cancelled calls by reason
//! - `connector_construction_failures_total` (counter): calls never dispatched
//! - `connector_in_flight_requests` (gauge): outstanding calls

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!(
        "connector_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        "connector_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_cancelled(reason: &'static str, count: usize) {
    ::metrics::counter!("connector_requests_cancelled_total", "reason" => reason)
        .increment(count as u64);
}

pub fn record_construction_failure(method: &str, kind: &'static str) {
    ::metrics::counter!(
        "connector_construction_failures_total",
        "method" => method.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// The gauge is shared by every connector in the process, so it is only
/// ever moved by deltas.
pub fn in_flight_added(count: usize) {
    ::metrics::gauge!("connector_in_flight_requests").increment(count as f64);
}

pub fn in_flight_removed(count: usize) {
    ::metrics::gauge!("connector_in_flight_requests").decrement(count as f64);
}
