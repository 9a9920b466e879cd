//! Axum route handlers.

use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use scribe_store::TranscriptionRow;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::ApiError;
use crate::health::{self, HealthResponse};
use crate::server::AppState;
use crate::upload;

/// Body of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Transcript text.
    pub transcript: Option<String>,
}

/// Body of the database probe.
#[derive(Debug, Serialize)]
pub struct TestDbResponse {
    /// Sampled rows, or `null` when the query failed.
    pub data: Option<Vec<TranscriptionRow>>,
    /// Error message, or `null`.
    pub error: Option<String>,
    /// Always `"Database test"`.
    pub message: &'static str,
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "upload without a multipart body");
        ApiError::MissingFile
    })?;

    let millis = chrono::Utc::now().timestamp_millis();
    let received = upload::receive(multipart, &state.upload_dir, millis).await?;
    let done = state.orchestrator.run(received).await?;

    Ok(Json(UploadResponse {
        success: true,
        transcript: done.transcript,
    }))
}

/// GET /
pub async fn root() -> &'static str {
    "Backend is working!"
}

/// GET /test-db
pub async fn test_db(State(state): State<AppState>) -> Json<TestDbResponse> {
    let (data, error) = match state.store.sample(1).await {
        Ok(rows) => (Some(rows), None),
        Err(e) => {
            warn!(error = %e, "database probe failed");
            (None, Some(e.to_string()))
        }
    };
    Json(TestDbResponse {
        data,
        error,
        message: "Database test",
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        &state.provider_id,
        state.shutdown.is_shutting_down(),
    ))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
