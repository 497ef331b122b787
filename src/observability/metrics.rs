//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by method, status, outcome
//! - `relay_request_duration_seconds` (histogram): time to response headers
//! - `relay_in_flight` (gauge): relay operations currently open
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels kept low-cardinality: no target hosts

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a relay request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Target response relayed to the caller.
    Relayed,
    /// Refused before any network activity (bad target, at capacity).
    Rejected,
    /// Transport fault classified into 502/504.
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Relayed => "relayed",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, outcome: Outcome, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str(),
    )
    .increment(1);

    metrics::histogram!(
        "relay_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome.as_str(),
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn set_in_flight(count: u64) {
    metrics::gauge!("relay_in_flight").set(count as f64);
}
