//! Core types for the transcription client.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Vendor-assigned identifier of a transcript job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct TranscriptId(pub String);

impl fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TranscriptId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a vendor job.
///
/// Unknown strings land in [`JobStatus::Other`] and are treated as still
/// running.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    /// Accepted, not yet started.
    Queued,
    /// In progress.
    Processing,
    /// Finished; `text` is populated.
    Completed,
    /// Finished unsuccessfully; `error` carries the vendor's message.
    Error,
    /// Any status string this client does not know.
    Other(String),
}

impl JobStatus {
    /// `completed` and `error` end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Wire string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by a status read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptStatus {
    /// Job id.
    pub id: TranscriptId,
    /// Current state.
    pub status: JobStatus,
    /// Transcript text, present once completed.
    #[serde(default)]
    pub text: Option<String>,
    /// Audio length in seconds.
    #[serde(default, alias = "audio_duration")]
    pub audio_duration_seconds: Option<f64>,
    /// Vendor failure message when `status` is `error`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Errors from the transcription vendor or the poll loop.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// Network failure, timeout, or undecodable body.
    #[error("request to transcription service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("transcription service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// A 2xx body that did not have the expected shape.
    #[error("unexpected response from transcription service: {0}")]
    Decode(String),

    /// Reading the local audio file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The vendor reported `error`; carries its message verbatim.
    #[error("{0}")]
    JobFailed(String),

    /// Poll bounds exhausted before a terminal status.
    #[error("transcription did not finish after {attempts} status checks ({waited:?})")]
    Timeout {
        /// Status reads performed.
        attempts: u32,
        /// Time spent polling.
        waited: Duration,
    },

    /// Polling was cancelled by shutdown.
    #[error("transcription cancelled: server is shutting down")]
    Cancelled,
}

/// Wraps `serde_json` failures into [`TranscriptionError::Decode`] with context.
pub trait ResultExt<T> {
    /// Wrap the error as [`TranscriptionError::Decode`] with `context` prefix.
    fn decode(self, context: &str) -> Result<T, TranscriptionError>;
}

impl<T, E: fmt::Display> ResultExt<T> for Result<T, E> {
    fn decode(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::Decode(format!("{context}: {e}")))
    }
}
