//! `tracing` subscriber setup.

use anyhow::{Result, anyhow};
use scribe_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// Run `f` under a temporary warn-level subscriber writing to stderr.
///
/// Settings are loaded before [`init`] knows the configured level, so their
/// clamp and parse warnings go here instead of being dropped.
pub fn bootstrap<T>(f: impl FnOnce() -> T) -> T {
    bootstrap_with_writer(std::io::stderr, f)
}

fn bootstrap_with_writer<W, T>(writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}
