//! Error types for the metadata store.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// No transcription row has the given id.
    #[error("transcription not found: {0}")]
    NotFound(i64),

    /// Internal error (e.g. a blocking task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
