//! Counter metrics

use super::labels;

/// Record the start of an acquisition
pub fn connect_attempted(mode: &'static str, tls: bool) {
    metrics::counter!(
        labels::CONNECT_ATTEMPTS,
        "mode" => mode,
        "tls" => if tls { "true" } else { "false" }
    )
    .increment(1);
}

/// Record a failed acquisition
pub fn connect_failed(mode: &'static str, category: &'static str) {
    metrics::counter!(
        labels::CONNECT_FAILURES,
        "mode" => mode,
        "category" => category
    )
    .increment(1);
}

/// Record a configuration rejected by validation
pub fn config_rejected(field: &'static str) {
    metrics::counter!(labels::CONFIG_REJECTED, "field" => field).increment(1);
}
