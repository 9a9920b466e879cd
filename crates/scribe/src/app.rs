//! Wiring: settings in, running server out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scribe_server::{ScribeServer, ServerConfig, wait_for_signal};
use scribe_settings::{ScribeSettings, StorageSettings, TranscriptionSettings};
use scribe_store::{ConnectionConfig, SqliteTranscriptionStore};
use scribe_transcription::{AssemblyAiClient, ClientConfig, PollPolicy};
use tracing::{info, warn};

/// Poll bounds from transcription settings.
pub fn poll_policy(settings: &TranscriptionSettings) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(settings.poll_interval_ms),
        max_attempts: settings.max_polls,
        max_wait: Duration::from_millis(settings.max_wait_ms),
    }
}

/// Vendor client parameters from transcription settings.
pub fn client_config(settings: &TranscriptionSettings) -> ClientConfig {
    ClientConfig {
        base_url: settings.base_url.clone(),
        api_key: settings.api_key.clone(),
        request_timeout: Duration::from_millis(settings.request_timeout_ms),
    }
}

/// Pool parameters from storage settings.
pub fn connection_config(settings: &StorageSettings) -> ConnectionConfig {
    ConnectionConfig {
        pool_size: settings.pool_size,
        busy_timeout_ms: settings.busy_timeout_ms,
    }
}

/// HTTP server parameters.
pub fn server_config(settings: &ScribeSettings) -> ServerConfig {
    ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        upload_dir: PathBuf::from(&settings.storage.upload_dir),
        max_upload_bytes: settings.server.max_upload_bytes,
        poll_policy: poll_policy(&settings.transcription),
    }
}

/// Build every component and serve until a shutdown signal arrives.
pub async fn run(settings: ScribeSettings) -> Result<()> {
    if settings.transcription.api_key.is_empty() {
        warn!("ASSEMBLYAI_API_KEY is not set; vendor calls will be rejected");
    }

    let store = SqliteTranscriptionStore::open(
        &settings.storage.database_path,
        &connection_config(&settings.storage),
    )
    .with_context(|| format!("failed to open database {}", settings.storage.database_path))?;
    info!(path = %settings.storage.database_path, "database ready");

    let provider = AssemblyAiClient::new(client_config(&settings.transcription))
        .context("failed to build transcription client")?;

    let metrics = scribe_server::metrics::install_recorder()
        .context("failed to install metrics recorder")?;

    let server = ScribeServer::new(
        server_config(&settings),
        Arc::new(store),
        Arc::new(provider),
    )
    .with_metrics(metrics);

    let (addr, handle) = server
        .listen()
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_addr()))?;
    info!(%addr, "scribe started");

    wait_for_signal().await;

    info!("shutting down");
    server
        .shutdown()
        .graceful_shutdown(
            handle,
            Some(Duration::from_millis(settings.server.shutdown_timeout_ms)),
        )
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_to_five_second_polls() {
        let policy = poll_policy(&TranscriptionSettings::default());
        assert_eq!(policy, PollPolicy::default());
    }

    #[test]
    fn server_config_carries_storage_and_limits() {
        let mut settings = ScribeSettings::default();
        settings.storage.upload_dir = "/var/scribe/uploads".into();
        settings.server.max_upload_bytes = Some(1024);
        settings.transcription.max_polls = 3;

        let config = server_config(&settings);
        assert_eq!(config.upload_dir, PathBuf::from("/var/scribe/uploads"));
        assert_eq!(config.max_upload_bytes, Some(1024));
        assert_eq!(config.poll_policy.max_attempts, 3);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn client_config_uses_key_and_timeout() {
        let mut settings = TranscriptionSettings::default();
        settings.api_key = "k".into();
        settings.request_timeout_ms = 2_500;
        let config = client_config(&settings);
        assert_eq!(config.api_key, "k");
        assert_eq!(config.request_timeout, Duration::from_millis(2_500));
        assert_eq!(config.base_url, "https://api.assemblyai.com");
    }

    #[test]
    fn connection_config_from_storage() {
        let config = connection_config(&StorageSettings::default());
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.busy_timeout_ms, 30_000);
    }
}
