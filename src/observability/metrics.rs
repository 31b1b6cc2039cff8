//! Metrics collection and exposition.
//!
//! # Metrics
//! - `canary_chirps_total` (counter): chirp cycles by outcome
//! - `canary_healthy` (gauge): 1=not unhealthy, 0=unhealthy
//! - `canary_alert_failures_total` (counter): failed alert fan-outs by transition

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::canary::ChirpOutcome;
use crate::health::HealthState;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_chirp(outcome: &ChirpOutcome) {
    metrics::counter!("canary_chirps_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_state(state: HealthState) {
    let value = match state {
        HealthState::NotUnhealthy => 1.0,
        HealthState::Unhealthy => 0.0,
    };
    metrics::gauge!("canary_healthy").set(value);
}

pub fn record_alert_failure(transition: &'static str) {
    metrics::counter!("canary_alert_failures_total", "transition" => transition).increment(1);
}
