//! Local storage settings.

use serde::{Deserialize, Serialize};

/// Upload directory and metadata database location.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Directory uploaded files are written to (relative to the working directory).
    pub upload_dir: String,
    /// SQLite database file for transcription records.
    pub database_path: String,
    /// Maximum pooled database connections.
    pub pool_size: u32,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".to_string(),
            database_path: "scribe.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: 30_000,
        }
    }
}
