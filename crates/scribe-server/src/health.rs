//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"shutting_down"` once shutdown has begun.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Transcription vendor in use.
    pub provider: String,
}

/// Build a health response.
pub fn health_check(start_time: Instant, provider: &str, shutting_down: bool) -> HealthResponse {
    HealthResponse {
        status: if shutting_down { "shutting_down" } else { "ok" }.into(),
        uptime_secs: start_time.elapsed().as_secs(),
        provider: provider.to_string(),
    }
}
