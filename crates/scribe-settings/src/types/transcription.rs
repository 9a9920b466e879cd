//! Transcription vendor settings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vendor endpoint, credential, and polling bounds.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionSettings {
    /// Vendor API base URL (no trailing slash).
    pub base_url: String,
    /// Static API key sent in the `authorization` header.
    pub api_key: String,
    /// Timeout for each individual vendor request.
    pub request_timeout_ms: u64,
    /// Pause before each status read.
    pub poll_interval_ms: u64,
    /// Maximum number of status reads per job.
    pub max_polls: u32,
    /// Wall-clock cap on polling a single job.
    pub max_wait_ms: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com".to_string(),
            api_key: String::new(),
            request_timeout_ms: 120_000,
            poll_interval_ms: 5_000,
            max_polls: 720,
            max_wait_ms: 3_600_000,
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for TranscriptionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionSettings")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field("max_wait_ms", &self.max_wait_ms)
            .finish()
    }
}
