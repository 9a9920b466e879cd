//! Row types returned by the repositories.

use serde::Serialize;

/// Store-assigned handle for a transcription row.
///
/// Returned by the placeholder insert and used as the only key for the
/// later result update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One row of the `transcriptions` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionRow {
    /// Row id.
    pub id: RecordId,
    /// Caller-supplied user identifier, unvalidated.
    pub user_id: Option<String>,
    /// `<unix_millis>-<original name>` of the stored upload.
    pub filename: String,
    /// Where the upload was written on local disk.
    pub filepath: String,
    /// Transcript text, set once the vendor job completes.
    pub transcript: Option<String>,
    /// Audio duration reported by the vendor.
    pub duration_seconds: Option<f64>,
    /// RFC 3339 insert time.
    pub created_at: String,
    /// RFC 3339 time of the last write.
    pub updated_at: String,
}

/// Fields for a new placeholder row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTranscription {
    /// Caller-supplied user identifier.
    pub user_id: Option<String>,
    /// Generated file name.
    pub filename: String,
    /// Local path of the stored file.
    pub filepath: String,
}
