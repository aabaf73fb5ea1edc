// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const HTTP_REQUESTS: &str = "gatekeeper_http_requests_total";
pub const REGISTRATIONS: &str = "gatekeeper_registrations_total";
pub const LOGIN_SUCCESS: &str = "gatekeeper_logins_total";
pub const LOGIN_FAILURE: &str = "gatekeeper_login_failures_total";
pub const REFRESHES: &str = "gatekeeper_refreshes_total";
pub const REFRESH_REJECTED: &str = "gatekeeper_refresh_rejected_total";
pub const LOGOUTS: &str = "gatekeeper_logouts_total";
pub const RATE_LIMITED: &str = "gatekeeper_rate_limited_total";
pub const SESSIONS_EXPIRED: &str = "gatekeeper_sessions_expired_total";
pub const LIMITER_BUCKETS: &str = "gatekeeper_limiter_buckets";

/// Install the global Prometheus recorder.
///
/// Fails if a recorder is already installed.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
