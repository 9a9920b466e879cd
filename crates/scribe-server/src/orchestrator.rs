//! Upload orchestration: placeholder row, vendor upload, job, poll, update.
//!
//! Runs strictly in sequence inside the request. Dropping the future (client
//! disconnect) stops it wherever it is; the shutdown token ends polling with
//! [`ApiError::Cancelled`].

use std::fmt;
use std::sync::Arc;

use scribe_store::{NewTranscription, RecordId, TranscriptionStore};
use scribe_transcription::{
    PollPolicy, TranscriptionError, TranscriptionProvider, poll_until_terminal,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::errors::ApiError;
use crate::metrics::{
    TRANSCRIPTION_DURATION_SECONDS, TRANSCRIPTION_POLLS_TOTAL, UPLOAD_FAILURES_TOTAL,
    UPLOADS_IN_FLIGHT, UPLOADS_TOTAL, VENDOR_ERRORS_TOTAL, VENDOR_REQUESTS_TOTAL,
};
use crate::upload::ReceivedUpload;

/// Where an upload is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    /// File is on disk.
    Received,
    /// Placeholder row exists.
    Persisted,
    /// Vendor holds the audio.
    Submitted,
    /// Vendor job exists.
    JobCreated,
    /// Waiting for a terminal status.
    Polling,
    /// Row updated with the transcript.
    Completed,
}

impl UploadState {
    /// Label used for logs and the failure counter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Persisted => "persisted",
            Self::Submitted => "submitted",
            Self::JobCreated => "job_created",
            Self::Polling => "polling",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully transcribed upload.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedUpload {
    /// Row holding the result.
    pub record_id: RecordId,
    /// Transcript text as reported by the vendor.
    pub transcript: Option<String>,
    /// Audio duration as reported by the vendor.
    pub duration_seconds: Option<f64>,
}

/// Drives one upload through the vendor.
pub struct UploadOrchestrator {
    store: Arc<dyn TranscriptionStore>,
    provider: Arc<dyn TranscriptionProvider>,
    policy: PollPolicy,
    cancel: CancellationToken,
}

struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics::gauge!(UPLOADS_IN_FLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::gauge!(UPLOADS_IN_FLIGHT).decrement(1.0);
    }
}

fn vendor_call<T>(
    operation: &'static str,
    result: Result<T, TranscriptionError>,
) -> Result<T, TranscriptionError> {
    metrics::counter!(VENDOR_REQUESTS_TOTAL, "operation" => operation).increment(1);
    if result.is_err() {
        metrics::counter!(VENDOR_ERRORS_TOTAL, "operation" => operation).increment(1);
    }
    result
}

impl UploadOrchestrator {
    /// Create an orchestrator. `cancel` is the server's shutdown token.
    pub fn new(
        store: Arc<dyn TranscriptionStore>,
        provider: Arc<dyn TranscriptionProvider>,
        policy: PollPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            provider,
            policy,
            cancel,
        }
    }

    /// Run the upload to completion.
    #[instrument(
        skip_all,
        fields(filename = %upload.filename, user_id = upload.user_id.as_deref())
    )]
    pub async fn run(&self, upload: ReceivedUpload) -> Result<CompletedUpload, ApiError> {
        let _in_flight = InFlight::enter();
        metrics::counter!(UPLOADS_TOTAL).increment(1);

        let mut state = UploadState::Received;
        let result = self.advance(upload, &mut state).await;
        if let Err(e) = &result {
            metrics::counter!(UPLOAD_FAILURES_TOTAL, "stage" => state.as_str()).increment(1);
            warn!(stage = %state, error = %e, "upload failed");
        }
        result
    }

    async fn advance(
        &self,
        upload: ReceivedUpload,
        state: &mut UploadState,
    ) -> Result<CompletedUpload, ApiError> {
        let placeholder = self
            .store
            .insert_placeholder(NewTranscription {
                user_id: upload.user_id.clone(),
                filename: upload.filename.clone(),
                filepath: upload.path.display().to_string(),
            })
            .await?;
        let record_id = placeholder.id;
        *state = UploadState::Persisted;
        info!(
            %record_id,
            original_name = %upload.original_name,
            size = upload.size,
            "placeholder stored"
        );

        let provider_id = self.provider.provider_id();
        let audio_url = vendor_call("upload", self.provider.upload_audio(&upload.path).await)?;
        *state = UploadState::Submitted;
        info!(%record_id, provider = provider_id, "audio submitted");

        let transcript_id = vendor_call(
            "create_transcript",
            self.provider.create_transcript(&audio_url).await,
        )?;
        *state = UploadState::JobCreated;
        info!(%record_id, %transcript_id, "transcript job created");

        *state = UploadState::Polling;
        let report = poll_until_terminal(
            &PollingProvider(self.provider.as_ref()),
            &transcript_id,
            &self.policy,
            &self.cancel,
        )
        .await?;
        metrics::histogram!(TRANSCRIPTION_DURATION_SECONDS).record(report.elapsed.as_secs_f64());

        let transcript = report.status.text;
        let duration_seconds = report.status.audio_duration_seconds;
        self.store
            .update_result(record_id, transcript.clone(), duration_seconds)
            .await?;
        *state = UploadState::Completed;
        info!(%record_id, %transcript_id, attempts = report.attempts, "transcription stored");

        Ok(CompletedUpload {
            record_id,
            transcript,
            duration_seconds,
        })
    }
}

/// Counts every status read the poller makes.
struct PollingProvider<'a>(&'a dyn TranscriptionProvider);

#[async_trait::async_trait]
impl<'a> TranscriptionProvider for PollingProvider<'a> {
    async fn upload_audio(&self, path: &std::path::Path) -> Result<String, TranscriptionError> {
        self.0.upload_audio(path).await
    }

    async fn create_transcript(
        &self,
        audio_url: &str,
    ) -> Result<scribe_transcription::TranscriptId, TranscriptionError> {
        self.0.create_transcript(audio_url).await
    }

    async fn get_transcript(
        &self,
        id: &scribe_transcription::TranscriptId,
    ) -> Result<scribe_transcription::TranscriptStatus, TranscriptionError> {
        metrics::counter!(TRANSCRIPTION_POLLS_TOTAL).increment(1);
        vendor_call("get_transcript", self.0.get_transcript(id).await)
    }

    fn provider_id(&self) -> &str {
        self.0.provider_id()
    }
}
