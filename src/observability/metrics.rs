//! Metrics collection and exposition.
//!
//! # Metrics
//! - `link_dispatch_total` (counter): links by outcome
//! - `link_pending` (gauge): links waiting for host readiness
//! - `link_config_applied_total` (counter): published configurations
//! - `link_config_version` (gauge): currently published version
//! - `link_config_rejected_total` (counter): rejected payloads by reason
//! - `link_bootstrap_total` (counter): bootstrap attempts by result
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no-ops until a recorder is installed
//! - The Prometheus exporter is installed by the binary, never by the library

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(outcome: &'static str) {
    metrics::counter!("link_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_pending(len: usize) {
    metrics::gauge!("link_pending").set(len as f64);
}

pub fn record_config_applied(version: u64) {
    metrics::counter!("link_config_applied_total").increment(1);
    metrics::gauge!("link_config_version").set(version as f64);
}

pub fn record_config_rejected(reason: &'static str) {
    metrics::counter!("link_config_rejected_total", "reason" => reason).increment(1);
}

pub fn record_bootstrap(result: &'static str) {
    metrics::counter!("link_bootstrap_total", "result" => result).increment(1);
}
