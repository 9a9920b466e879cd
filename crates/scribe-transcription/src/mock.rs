//! Scripted in-process provider for testing.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::provider::TranscriptionProvider;
use crate::types::{JobStatus, TranscriptId, TranscriptStatus, TranscriptionError};

/// A call received by [`MockTranscriptionProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `upload_audio`, with the bytes found at `path` at call time.
    Upload {
        /// Path passed in.
        path: PathBuf,
        /// File contents.
        bytes: Vec<u8>,
    },
    /// `create_transcript`.
    Create(String),
    /// `get_transcript`.
    Get(TranscriptId),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Upload,
    Create,
    Get,
}

/// Mock provider for testing.
///
/// Status reads pop from a scripted queue; once the queue is empty every
/// read reports `processing`. A failure can be injected at any one stage.
pub struct MockTranscriptionProvider {
    upload_url: String,
    transcript_id: TranscriptId,
    statuses: Mutex<VecDeque<TranscriptStatus>>,
    failure: Mutex<Option<(Stage, u16, String)>>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockTranscriptionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscriptionProvider {
    /// Provider answering upload with `https://cdn.example/upload/1` and
    /// job creation with id `J`.
    pub fn new() -> Self {
        Self {
            upload_url: "https://cdn.example/upload/1".into(),
            transcript_id: TranscriptId::from("J"),
            statuses: Mutex::new(VecDeque::new()),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue `processing` reads followed by a `completed` read.
    pub fn completing_after(processing: usize, text: &str, duration_seconds: f64) -> Self {
        let mock = Self::new();
        for _ in 0..processing {
            mock.push_status(JobStatus::Processing, None, None, None);
        }
        mock.push_status(
            JobStatus::Completed,
            Some(text),
            Some(duration_seconds),
            None,
        );
        mock
    }

    /// Queue `processing` reads followed by an `error` read.
    pub fn failing_after(processing: usize, message: &str) -> Self {
        let mock = Self::new();
        for _ in 0..processing {
            mock.push_status(JobStatus::Processing, None, None, None);
        }
        mock.push_status(JobStatus::Error, None, None, Some(message));
        mock
    }

    /// Append one status read to the script.
    pub fn push_status(
        &self,
        status: JobStatus,
        text: Option<&str>,
        duration_seconds: Option<f64>,
        error: Option<&str>,
    ) {
        self.statuses.lock().push_back(TranscriptStatus {
            id: self.transcript_id.clone(),
            status,
            text: text.map(String::from),
            audio_duration_seconds: duration_seconds,
            error: error.map(String::from),
        });
    }

    /// Make `upload_audio` fail with the given HTTP status.
    pub fn fail_upload(&self, status: u16, body: &str) {
        *self.failure.lock() = Some((Stage::Upload, status, body.to_string()));
    }

    /// Make `create_transcript` fail with the given HTTP status.
    pub fn fail_create(&self, status: u16, body: &str) {
        *self.failure.lock() = Some((Stage::Create, status, body.to_string()));
    }

    /// Make `get_transcript` fail with the given HTTP status.
    pub fn fail_get(&self, status: u16, body: &str) {
        *self.failure.lock() = Some((Stage::Get, status, body.to_string()));
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Number of `get_transcript` calls.
    pub fn status_reads(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, MockCall::Get(_)))
            .count()
    }

    fn injected(&self, stage: Stage) -> Result<(), TranscriptionError> {
        match self.failure.lock().as_ref() {
            Some((s, status, body)) if *s == stage => Err(TranscriptionError::Status {
                status: *status,
                body: body.clone(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for MockTranscriptionProvider {
    async fn upload_audio(&self, path: &Path) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(path).await?;
        self.calls.lock().push(MockCall::Upload {
            path: path.to_path_buf(),
            bytes,
        });
        self.injected(Stage::Upload)?;
        Ok(self.upload_url.clone())
    }

    async fn create_transcript(&self, audio_url: &str) -> Result<TranscriptId, TranscriptionError> {
        self.calls.lock().push(MockCall::Create(audio_url.to_string()));
        self.injected(Stage::Create)?;
        Ok(self.transcript_id.clone())
    }

    async fn get_transcript(
        &self,
        id: &TranscriptId,
    ) -> Result<TranscriptStatus, TranscriptionError> {
        self.calls.lock().push(MockCall::Get(id.clone()));
        self.injected(Stage::Get)?;
        let next = self.statuses.lock().pop_front();
        Ok(next.unwrap_or_else(|| TranscriptStatus {
            id: id.clone(),
            status: JobStatus::Processing,
            text: None,
            audio_duration_seconds: None,
            error: None,
        }))
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn scripted_statuses_then_processing() {
        let mock = MockTranscriptionProvider::completing_after(1, "hi", 1.5);
        let id = TranscriptId::from("J");
        assert_eq!(mock.get_transcript(&id).await.unwrap().status, JobStatus::Processing);
        let done = mock.get_transcript(&id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.text.as_deref(), Some("hi"));
        assert_eq!(mock.get_transcript(&id).await.unwrap().status, JobStatus::Processing);
        assert_eq!(mock.status_reads(), 3);
    }

    #[tokio::test]
    async fn upload_records_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.wav");
        std::fs::write(&file, b"abc").unwrap();

        let mock = MockTranscriptionProvider::new();
        let url = mock.upload_audio(&file).await.unwrap();
        assert_eq!(url, "https://cdn.example/upload/1");
        assert_eq!(
            mock.calls(),
            vec![MockCall::Upload {
                path: file,
                bytes: b"abc".to_vec()
            }]
        );
    }

    #[tokio::test]
    async fn injected_failure_hits_one_stage() {
        let mock = MockTranscriptionProvider::new();
        mock.fail_create(500, "boom");
        let err = mock.create_transcript("u").await.unwrap_err();
        assert_matches!(err, TranscriptionError::Status { status: 500, .. });
        assert!(mock.get_transcript(&TranscriptId::from("J")).await.is_ok());
    }
}
