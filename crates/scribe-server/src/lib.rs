//! # scribe-server
//!
//! Axum HTTP server that accepts audio uploads and returns their transcripts.
//!
//! ## Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /upload` | multipart `file` + optional `user_id` → `{success, transcript}` |
//! | `GET /` | liveness text |
//! | `GET /test-db` | one-row store probe |
//! | `GET /health` | uptime and shutdown state |
//! | `GET /metrics` | Prometheus text |
//!
//! ## Crate Position
//!
//! Depends on: scribe-store, scribe-transcription.
//! Depended on by: scribe (binary).

#![deny(unsafe_code)]

pub mod errors;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod orchestrator;
pub mod server;
pub mod shutdown;
pub mod upload;

pub use errors::ApiError;
pub use orchestrator::{CompletedUpload, UploadOrchestrator, UploadState};
pub use server::{AppState, ScribeServer, ServerConfig};
pub use shutdown::{ShutdownCoordinator, wait_for_signal};
