//! HTTP-facing error type for the upload flow.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use scribe_store::StoreError;
use scribe_transcription::TranscriptionError;
use serde_json::json;
use thiserror::Error;

/// Everything that can end an upload request early.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No `file` part, or the body was not multipart at all.
    #[error("No file uploaded.")]
    MissingFile,

    /// More than one `file` part.
    #[error("Only one file may be uploaded.")]
    ExtraFile,

    /// Malformed multipart body.
    #[error("invalid multipart body: {0}")]
    Multipart(String),

    /// Writing the upload to disk failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata store failure.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The vendor call failed (network, status, or body).
    #[error("{0}")]
    Vendor(String),

    /// The vendor reported the job as failed; message is the vendor's.
    #[error("{0}")]
    JobFailed(String),

    /// Polling gave up.
    #[error("{0}")]
    Timeout(String),

    /// Server is shutting down.
    #[error("{0}")]
    Cancelled(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::ExtraFile | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) | Self::Store(_) | Self::Vendor(_) | Self::JobFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<TranscriptionError> for ApiError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::JobFailed(message) => Self::JobFailed(message),
            err @ TranscriptionError::Timeout { .. } => Self::Timeout(err.to_string()),
            err @ TranscriptionError::Cancelled => Self::Cancelled(err.to_string()),
            err => Self::Vendor(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Plain text, not JSON.
            Self::MissingFile => (status, self.to_string()).into_response(),
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}
