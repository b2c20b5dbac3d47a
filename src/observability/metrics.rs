//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_proposals_total` (counter): proposals sent, by kind
//! - `ledger_endorsements_total` (counter): per-peer outcomes
//! - `ledger_endorsement_duration_seconds` (histogram): one dispatch round
//! - `ledger_submissions_total` (counter): ordering outcomes
//! - `ledger_commits_total` (counter): commit wait outcomes
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// `kind` is `invoke` or `query`.
pub fn record_proposal(kind: &'static str) {
    counter!("ledger_proposals_total", "kind" => kind).increment(1);
}

pub fn record_endorsement(outcome: &'static str) {
    counter!("ledger_endorsements_total", "outcome" => outcome).increment(1);
}

pub fn record_endorsement_round(elapsed: Duration) {
    histogram!("ledger_endorsement_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_submission(outcome: &'static str) {
    counter!("ledger_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_commit(outcome: &'static str) {
    counter!("ledger_commits_total", "outcome" => outcome).increment(1);
}
