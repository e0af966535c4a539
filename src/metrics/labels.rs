//! Metric names and label values

/// Acquisitions started
pub const CONNECT_ATTEMPTS: &str = "ldap_connect_attempts_total";
/// Acquisitions that returned an error
pub const CONNECT_FAILURES: &str = "ldap_connect_failures_total";
/// Configurations rejected by validation
pub const CONFIG_REJECTED: &str = "ldap_config_rejected_total";
/// Open duration in milliseconds
pub const CONNECT_DURATION: &str = "ldap_connect_duration_ms";

/// Bind with the configured search identity
pub const MODE_SERVICE: &str = "service";
/// Bind with caller-supplied credentials
pub const MODE_CALLER: &str = "caller";
