//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define receiver metrics (connections, accept errors, bytes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `recvlog_connections_accepted_total` (counter)
//! - `recvlog_accept_errors_total` (counter)
//! - `recvlog_reads_total` (counter): successful reads with data
//! - `recvlog_bytes_received_total` (counter)
//! - `recvlog_active_connections` (gauge): live handlers
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_accepted() {
    metrics::counter!("recvlog_connections_accepted_total").increment(1);
}

pub fn record_accept_error() {
    metrics::counter!("recvlog_accept_errors_total").increment(1);
}

pub fn record_read(bytes: usize) {
    metrics::counter!("recvlog_reads_total").increment(1);
    metrics::counter!("recvlog_bytes_received_total").increment(bytes as u64);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("recvlog_active_connections").set(count as f64);
}
