//! # scribe-store
//!
//! Transcription metadata store with a `SQLite` backend.
//!
//! - **Placeholder rows**: inserted as soon as an upload is on disk
//! - **Result updates**: keyed by the [`RecordId`] the insert returned
//! - **Probe reads**: a bounded sample for the connectivity check
//! - **Migrations**: version-tracked SQL embedded at compile time

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use sqlite::connection::ConnectionConfig;
pub use sqlite::row_types::{NewTranscription, RecordId, TranscriptionRow};
pub use store::{SqliteTranscriptionStore, TranscriptionStore};
