// src/metrics.rs

//! Promotion counters exported for Prometheus.
//!
//! The recording functions are no-ops when the `metrics` feature is off, so
//! callers never need their own `cfg` guards.

#[cfg(feature = "metrics")]
use ::metrics::counter;
#[cfg(feature = "metrics")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[cfg(feature = "metrics")]
pub type MetricsHandle = PrometheusHandle;

/// Placeholder so `AppState` has the same shape with the feature disabled.
#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone)]
pub struct MetricsHandle;

#[cfg(not(feature = "metrics"))]
impl MetricsHandle {
    pub fn render(&self) -> String {
        String::new()
    }
}

/// Installs the global Prometheus recorder. Returns `None` if a recorder is
/// already installed or the feature is disabled.
pub fn install_recorder() -> Option<MetricsHandle> {
    #[cfg(feature = "metrics")]
    {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Prometheus recorder not installed");
                None
            }
        }
    }
    #[cfg(not(feature = "metrics"))]
    {
        None
    }
}

pub fn record_spin(outcome: &'static str) {
    #[cfg(feature = "metrics")]
    counter!("promotion_spins_total", "outcome" => outcome).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = outcome;
}

/// Label value for prizes without a configured monthly limit.
pub const OTHER_PRIZE_LABEL: &str = "other";

/// `prize` must come from a bounded set; every distinct value is a new series
/// held by the recorder for the life of the process.
pub fn record_prize_award(prize: &str) {
    #[cfg(feature = "metrics")]
    counter!("promotion_prize_awards_total", "prize" => prize.to_string()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = prize;
}

pub fn record_forced_win() {
    #[cfg(feature = "metrics")]
    counter!("promotion_forced_wins_total").increment(1);
}

pub fn record_fail_open() {
    #[cfg(feature = "metrics")]
    counter!("promotion_fail_open_total").increment(1);
}
