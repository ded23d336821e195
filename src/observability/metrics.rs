//! Metrics collection and exposition.
//!
//! # Metrics
//! - `waitlist_http_requests_total` (counter): requests by method, route, status
//! - `waitlist_submissions_total` (counter): submissions by outcome
//! - `waitlist_submission_duration_seconds` (histogram): handler latency
//! - `waitlist_rate_limited_total` (counter): denied submissions
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &'static str, status: u16) {
    counter!(
        "waitlist_http_requests_total",
        "method" => method.to_string(),
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_submission(outcome: &'static str, start: Instant) {
    counter!("waitlist_submissions_total", "outcome" => outcome).increment(1);
    histogram!("waitlist_submission_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("waitlist_rate_limited_total").increment(1);
}
