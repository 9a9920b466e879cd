//! Bounded, cancellable status polling.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::provider::TranscriptionProvider;
use crate::types::{JobStatus, TranscriptId, TranscriptStatus, TranscriptionError};

/// Message used when the vendor reports `error` without saying why.
const UNSPECIFIED_FAILURE: &str = "transcription failed";

/// How often and for how long a job is polled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause before every status read.
    pub interval: Duration,
    /// Status reads allowed before giving up.
    pub max_attempts: u32,
    /// Wall time allowed before giving up.
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 720,
            max_wait: Duration::from_secs(3600),
        }
    }
}

/// A job that reached `completed`.
#[derive(Clone, Debug)]
pub struct PollReport {
    /// The completed status.
    pub status: TranscriptStatus,
    /// Status reads performed, including the final one.
    pub attempts: u32,
    /// Time from the start of polling to the final read.
    pub elapsed: Duration,
}

/// Poll `id` until it completes or fails.
///
/// Sleeps `policy.interval` before each read, so there is at most one read
/// per interval. Stops with [`TranscriptionError::Timeout`] when the next
/// read would exceed either bound, and with
/// [`TranscriptionError::Cancelled`] as soon as `cancel` fires. A status of
/// `error` becomes [`TranscriptionError::JobFailed`] with the vendor's
/// message.
pub async fn poll_until_terminal(
    provider: &dyn TranscriptionProvider,
    id: &TranscriptId,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<PollReport, TranscriptionError> {
    let started = Instant::now();
    let deadline = started + policy.max_wait;
    let mut attempts = 0_u32;

    loop {
        let wake = Instant::now() + policy.interval;
        if attempts >= policy.max_attempts || wake > deadline {
            warn!(transcript_id = %id, attempts, "poll bounds exhausted");
            return Err(TranscriptionError::Timeout {
                attempts,
                waited: started.elapsed(),
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
            () = sleep_until(wake) => {}
        }

        attempts += 1;
        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
            status = provider.get_transcript(id) => status?,
        };

        if status.status.is_terminal() {
            if status.status == JobStatus::Error {
                let message = status
                    .error
                    .unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string());
                return Err(TranscriptionError::JobFailed(message));
            }
            return Ok(PollReport {
                status,
                attempts,
                elapsed: started.elapsed(),
            });
        }
        debug!(
            transcript_id = %id,
            attempt = attempts,
            status = %status.status,
            "transcript not ready"
        );
    }
}
