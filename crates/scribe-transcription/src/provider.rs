//! The seam between the upload flow and a speech-to-text vendor.

use std::path::Path;

use async_trait::async_trait;

use crate::types::{TranscriptId, TranscriptStatus, TranscriptionError};

/// A hosted speech-to-text service driven by upload, submit and poll.
///
/// Every call is a single attempt. Callers decide whether and how often to
/// repeat [`get_transcript`](Self::get_transcript).
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Send the file at `path` to vendor storage, returning the URL the
    /// vendor assigned to it.
    async fn upload_audio(&self, path: &Path) -> Result<String, TranscriptionError>;

    /// Start a transcript job for previously uploaded audio.
    async fn create_transcript(&self, audio_url: &str) -> Result<TranscriptId, TranscriptionError>;

    /// Read the current state of a job.
    async fn get_transcript(&self, id: &TranscriptId)
    -> Result<TranscriptStatus, TranscriptionError>;

    /// Lowercase vendor name, used as a metrics and log label.
    fn provider_id(&self) -> &str;
}
