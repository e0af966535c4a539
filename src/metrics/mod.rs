//! Metrics for connection acquisition
//!
//! Thin wrappers over the `metrics` facade. Nothing is recorded unless the
//! application installs a recorder.

pub mod counters;
pub mod histograms;
pub mod labels;
