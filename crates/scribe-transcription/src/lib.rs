//! Client for a hosted speech-to-text vendor speaking the AssemblyAI v2
//! protocol.
//!
//! # Architecture
//!
//! ```text
//! local file → POST /v2/upload → upload_url
//! upload_url → POST /v2/transcript → transcript id
//! transcript id → GET /v2/transcript/{id} every interval → completed | error
//! ```
//!
//! [`TranscriptionProvider`] is the seam; [`AssemblyAiClient`] implements it
//! over `reqwest` and [`MockTranscriptionProvider`] replays a script for
//! tests. [`poll_until_terminal`] owns the wait loop and its bounds.
//!
//! ## Crate Position
//!
//! Standalone (no scribe crate dependencies).
//! Depended on by: scribe-server, scribe.

#![deny(unsafe_code)]

pub mod client;
pub mod mock;
pub mod poller;
pub mod provider;
pub mod types;

pub use client::{AssemblyAiClient, ClientConfig};
pub use mock::{MockCall, MockTranscriptionProvider};
pub use poller::{PollPolicy, PollReport, poll_until_terminal};
pub use provider::TranscriptionProvider;
pub use types::{JobStatus, ResultExt, TranscriptId, TranscriptStatus, TranscriptionError};
