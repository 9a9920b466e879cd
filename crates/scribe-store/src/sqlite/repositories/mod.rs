//! Repository implementations.
//!
//! Each repository is a stateless struct whose methods take a `&Connection`.

pub mod transcription;

pub use transcription::TranscriptionRepo;
