//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_reads_total` (counter): served reads
//! - `config_updates_total` (counter): updates by outcome
//! - `config_update_duration_seconds` (histogram): update latency, gate to response

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// How an update request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    Rejected,
    Disabled,
    Failed,
}

impl UpdateOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOutcome::Applied => "applied",
            UpdateOutcome::Rejected => "rejected",
            UpdateOutcome::Disabled => "disabled",
            UpdateOutcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_read() {
    counter!("config_reads_total").increment(1);
}

pub fn record_update(outcome: UpdateOutcome, start: Instant) {
    counter!("config_updates_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("config_update_duration_seconds").record(start.elapsed().as_secs_f64());
}
