//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ScribeSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. [`ScribeSettings::validate`] clamps anything out of range
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::ScribeSettings;

/// Default settings file name, resolved against the working directory.
const DEFAULT_SETTINGS_FILE: &str = "scribe.json";

/// Resolve the settings file path: `$SCRIBE_SETTINGS` or `./scribe.json`.
pub fn settings_path() -> PathBuf {
    std::env::var("SCRIBE_SETTINGS")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ScribeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. A file that is not valid JSON, or whose
/// top level is not an object, is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ScribeSettings> {
    let defaults = serde_json::to_value(ScribeSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        if !user.is_object() {
            return Err(SettingsError::InvalidValue(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        }
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ScribeSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut ScribeSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
///
/// `SCRIBE_PORT` wins over the conventional `PORT`.
pub fn apply_overrides_from(
    settings: &mut ScribeSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("SCRIBE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env
        .u64_range("SCRIBE_PORT", 1, 65_535)
        .or_else(|| env.u64_range("PORT", 1, 65_535))
    {
        settings.server.port = v as u16;
    }
    if let Some(v) = env.u64_range("SCRIBE_MAX_UPLOAD_BYTES", 1, u64::MAX) {
        settings.server.max_upload_bytes = Some(usize::try_from(v).unwrap_or(usize::MAX));
    }

    // ── Storage ─────────────────────────────────────────────────────
    if let Some(v) = env.string("SCRIBE_UPLOAD_DIR") {
        settings.storage.upload_dir = v;
    }
    if let Some(v) = env.string("SCRIBE_DATABASE_PATH") {
        settings.storage.database_path = v;
    }

    // ── Transcription ───────────────────────────────────────────────
    if let Some(v) = env.string("ASSEMBLYAI_API_KEY") {
        settings.transcription.api_key = v;
    }
    if let Some(v) = env.string("SCRIBE_TRANSCRIPTION_URL") {
        settings.transcription.base_url = v;
    }
    if let Some(v) = env.u64_range("SCRIBE_REQUEST_TIMEOUT_MS", 1_000, 3_600_000) {
        settings.transcription.request_timeout_ms = v;
    }
    if let Some(v) = env.u64_range("SCRIBE_POLL_INTERVAL_MS", 100, 600_000) {
        settings.transcription.poll_interval_ms = v;
    }
    if let Some(v) = env.u64_range("SCRIBE_MAX_POLLS", 1, u64::from(u32::MAX)) {
        settings.transcription.max_polls = v as u32;
    }
    if let Some(v) = env.u64_range("SCRIBE_MAX_WAIT_MS", 1_000, 86_400_000) {
        settings.transcription.max_wait_ms = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("SCRIBE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("SCRIBE_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64_range(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
