//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_sessions_total` (counter): upgraded connections
//! - `bridge_active_sessions` (gauge): currently open sessions
//! - `bridge_upgrade_failures_total` (counter): rejected handshakes
//! - `bridge_messages_total` (counter): text messages by outcome (`ok`, `error`)
//! - `bridge_skipped_frames_total` (counter): non-text frames by kind
//! - `bridge_backend_call_duration_seconds` (histogram): backend latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn session_opened() {
    ::metrics::counter!("bridge_sessions_total").increment(1);
    ::metrics::gauge!("bridge_active_sessions").increment(1.0);
}

pub fn session_closed() {
    ::metrics::gauge!("bridge_active_sessions").decrement(1.0);
}

pub fn upgrade_failed() {
    ::metrics::counter!("bridge_upgrade_failures_total").increment(1);
}

pub fn frame_skipped(kind: &'static str) {
    ::metrics::counter!("bridge_skipped_frames_total", "kind" => kind).increment(1);
}

/// Record one processed text message and the backend latency.
pub fn record_message(outcome: &'static str, start: Instant) {
    ::metrics::counter!("bridge_messages_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("bridge_backend_call_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
