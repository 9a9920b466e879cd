//! # scribe-settings
//!
//! Configuration for the scribe upload server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ScribeSettings::default()`]
//! 2. **Settings file**: `./scribe.json` or `$SCRIBE_SETTINGS` (deep-merged over defaults)
//! 3. **Environment variables**: `SCRIBE_*` overrides plus `PORT` and
//!    `ASSEMBLYAI_API_KEY` (highest priority)
//!
//! The binary loads settings once at startup and hands each component the
//! section it needs. Nothing below the binary reads the environment.
//!
//! # Usage
//!
//! ```no_run
//! use scribe_settings::{load_settings_from_path, settings_path};
//!
//! let settings = load_settings_from_path(&settings_path()).unwrap();
//! println!("listening on port {}", settings.server.port);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = ScribeSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }

    #[test]
    fn load_from_missing_path_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings.storage.upload_dir, "uploads");
        assert_eq!(settings.transcription.poll_interval_ms, 5_000);
    }
}
