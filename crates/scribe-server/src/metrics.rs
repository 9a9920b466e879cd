//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Call once at startup before any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Uploads received (counter).
pub const UPLOADS_TOTAL: &str = "uploads_total";
/// Uploads that ended in an error (counter, labels: stage).
pub const UPLOAD_FAILURES_TOTAL: &str = "upload_failures_total";
/// Uploads currently being processed (gauge).
pub const UPLOADS_IN_FLIGHT: &str = "uploads_in_flight";
/// Calls to the transcription vendor (counter, labels: operation).
pub const VENDOR_REQUESTS_TOTAL: &str = "vendor_requests_total";
/// Failed calls to the transcription vendor (counter, labels: operation).
pub const VENDOR_ERRORS_TOTAL: &str = "vendor_errors_total";
/// Status reads performed while polling (counter).
pub const TRANSCRIPTION_POLLS_TOTAL: &str = "transcription_polls_total";
/// Time from job creation to a completed transcript (histogram).
pub const TRANSCRIPTION_DURATION_SECONDS: &str = "transcription_duration_seconds";
