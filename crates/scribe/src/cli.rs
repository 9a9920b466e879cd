//! Command-line flags. Each one overrides the matching setting.

use std::path::PathBuf;

use clap::Parser;
use scribe_settings::ScribeSettings;

/// Audio upload and transcription server.
#[derive(Parser, Debug, Default)]
#[command(name = "scribe", version, about = "Audio upload and transcription server")]
pub struct Cli {
    /// Settings file (default: `$SCRIBE_SETTINGS` or `./scribe.json`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Host to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    pub port: Option<u16>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Layer the flags over loaded settings.
    pub fn apply(&self, settings: &mut ScribeSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }
}
