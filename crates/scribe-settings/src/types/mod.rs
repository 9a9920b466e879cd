//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format. Each type implements [`Default`] with production values, and
//! `#[serde(default)]` lets a settings file name only the keys it changes.

mod logging;
mod server;
mod storage;
mod transcription;

pub use logging::*;
pub use server::*;
pub use storage::*;
pub use transcription::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "port": 8080 },
///   "transcription": { "apiKey": "...", "pollIntervalMs": 3000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScribeSettings {
    /// HTTP listener settings.
    pub server: ServerSettings,
    /// Upload directory and metadata database.
    pub storage: StorageSettings,
    /// Transcription vendor and polling settings.
    pub transcription: TranscriptionSettings,
    /// Log level and format.
    pub logging: LoggingSettings,
}

/// Smallest accepted poll interval.
const MIN_POLL_INTERVAL_MS: u64 = 100;

impl ScribeSettings {
    /// Correct values that would make the server misbehave.
    ///
    /// Called automatically during loading. Out-of-range values are clamped
    /// with a warning rather than rejected.
    pub fn validate(&mut self) {
        let t = &mut self.transcription;
        if t.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            tracing::warn!(
                "pollIntervalMs too small ({}), clamped to {MIN_POLL_INTERVAL_MS}",
                t.poll_interval_ms
            );
            t.poll_interval_ms = MIN_POLL_INTERVAL_MS;
        }
        if t.max_polls == 0 {
            tracing::warn!("maxPolls must be at least 1, using 1");
            t.max_polls = 1;
        }
        if t.max_wait_ms < t.poll_interval_ms {
            tracing::warn!(
                "maxWaitMs ({}) shorter than pollIntervalMs, raised to {}",
                t.max_wait_ms,
                t.poll_interval_ms
            );
            t.max_wait_ms = t.poll_interval_ms;
        }
        if t.base_url.ends_with('/') {
            t.base_url = t.base_url.trim_end_matches('/').to_string();
        }

        if self.storage.pool_size == 0 {
            tracing::warn!("poolSize must be at least 1, using 1");
            self.storage.pool_size = 1;
        }
    }
}
