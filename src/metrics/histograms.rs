//! Histogram metrics

use super::labels;

/// Record how long the open call took, successful or not
pub fn connect_duration(mode: &'static str, duration_ms: u64) {
    metrics::histogram!(labels::CONNECT_DURATION, "mode" => mode).record(duration_ms as f64);
}
