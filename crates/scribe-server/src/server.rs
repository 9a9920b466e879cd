//! `ScribeServer`, the Axum HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use scribe_store::TranscriptionStore;
use scribe_transcription::{PollPolicy, TranscriptionProvider};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::orchestrator::UploadOrchestrator;
use crate::shutdown::ShutdownCoordinator;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` picks a free port).
    pub port: u16,
    /// Directory uploads are written to.
    pub upload_dir: PathBuf,
    /// Request body cap in bytes; `None` disables the cap.
    pub max_upload_bytes: Option<usize>,
    /// Poll policy for vendor jobs.
    pub poll_policy: PollPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: None,
            poll_policy: PollPolicy::default(),
        }
    }
}

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload pipeline.
    pub orchestrator: Arc<UploadOrchestrator>,
    /// Metadata store.
    pub store: Arc<dyn TranscriptionStore>,
    /// Where uploads are written.
    pub upload_dir: PathBuf,
    /// Vendor name for `/health`.
    pub provider_id: String,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The transcription upload server.
pub struct ScribeServer {
    config: ServerConfig,
    state: AppState,
}

impl ScribeServer {
    /// Create a new server.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn TranscriptionStore>,
        provider: Arc<dyn TranscriptionProvider>,
    ) -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let provider_id = provider.provider_id().to_string();
        let orchestrator = Arc::new(UploadOrchestrator::new(
            store.clone(),
            provider,
            config.poll_policy.clone(),
            shutdown.token(),
        ));
        let state = AppState {
            orchestrator,
            store,
            upload_dir: config.upload_dir.clone(),
            provider_id,
            shutdown,
            start_time: Instant::now(),
            metrics: None,
        };
        Self { config, state }
    }

    /// Serve `/metrics` from this handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let body_limit = match self.config.max_upload_bytes {
            Some(limit) => DefaultBodyLimit::max(limit),
            None => DefaultBodyLimit::disable(),
        };

        Router::new()
            .route("/", get(handlers::root))
            .route("/upload", post(handlers::upload))
            .route("/test-db", get(handlers::test_db))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .with_state(self.state.clone())
            .layer(body_limit)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind and serve until the shutdown token is cancelled.
    ///
    /// Returns the bound address and the task running the server.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
        tokio::fs::create_dir_all(&self.config.upload_dir).await?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(
            %local_addr,
            upload_dir = %self.config.upload_dir.display(),
            "scribe server listening"
        );

        let router = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
        });
        Ok((local_addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use scribe_store::{SqliteTranscriptionStore, StoreError};
    use scribe_transcription::MockTranscriptionProvider;
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "scribe-test-boundary";

    struct Harness {
        dir: tempfile::TempDir,
        store: Arc<SqliteTranscriptionStore>,
        provider: Arc<MockTranscriptionProvider>,
        server: ScribeServer,
    }

    fn harness_with(provider: MockTranscriptionProvider, config: ServerConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteTranscriptionStore::in_memory().unwrap());
        let provider = Arc::new(provider);
        let config = ServerConfig {
            upload_dir: dir.path().join("uploads"),
            ..config
        };
        let server = ScribeServer::new(config, store.clone(), provider.clone());
        Harness {
            dir,
            store,
            provider,
            server,
        }
    }

    fn harness(provider: MockTranscriptionProvider) -> Harness {
        harness_with(provider, ServerConfig::default())
    }

    enum Part<'a> {
        File(&'a str, &'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File(field, filename, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                             Content-Type: audio/wav\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text(field, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 100_000)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn uploaded_files(h: &Harness) -> Vec<String> {
        match std::fs::read_dir(h.dir.path().join("uploads")) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let h = harness(MockTranscriptionProvider::new());
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 1_000).await.unwrap();
        assert_eq!(&body[..], b"Backend is working!");
    }

    #[tokio::test(start_paused = true)]
    async fn upload_sample_end_to_end() {
        let h = harness(MockTranscriptionProvider::completing_after(
            2,
            "hello world",
            3.2,
        ));
        let req = upload_request(&[
            Part::File("file", "sample.wav", b"RIFF-audio"),
            Part::Text("user_id", "42"),
        ]);

        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "success": true, "transcript": "hello world" })
        );

        let rows = h.store.sample(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.user_id.as_deref(), Some("42"));
        assert_eq!(row.transcript.as_deref(), Some("hello world"));
        assert_eq!(row.duration_seconds, Some(3.2));

        let (millis, name) = row.filename.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert_eq!(name, "sample.wav");
        assert!(row.filepath.ends_with(&row.filename));

        assert_eq!(uploaded_files(&h), vec![row.filename.clone()]);
        assert_eq!(
            std::fs::read(h.dir.path().join("uploads").join(&row.filename)).unwrap(),
            b"RIFF-audio"
        );
        assert_eq!(h.provider.status_reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn user_id_may_precede_file() {
        let h = harness(MockTranscriptionProvider::completing_after(0, "ok", 1.0));
        let req = upload_request(&[
            Part::Text("user_id", "7"),
            Part::File("file", "a.mp3", b"x"),
        ]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            h.store.sample(1).await.unwrap()[0].user_id.as_deref(),
            Some("7")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_user_id_stored_as_null() {
        let h = harness(MockTranscriptionProvider::completing_after(0, "ok", 1.0));
        let req = upload_request(&[Part::File("file", "a.mp3", b"x")]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(h.store.sample(1).await.unwrap()[0].user_id.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_400_with_no_side_effects() {
        let h = harness(MockTranscriptionProvider::new());
        let req = upload_request(&[Part::Text("user_id", "42")]);

        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(resp.into_body(), 1_000).await.unwrap();
        assert_eq!(&body[..], b"No file uploaded.");

        assert!(h.store.sample(10).await.unwrap().is_empty());
        assert!(h.provider.calls().is_empty());
        assert!(uploaded_files(&h).is_empty());
    }

    #[tokio::test]
    async fn non_multipart_body_is_missing_file() {
        let h = harness(MockTranscriptionProvider::new());
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(h.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn second_file_is_rejected() {
        let h = harness(MockTranscriptionProvider::new());
        let req = upload_request(&[
            Part::File("file", "a.wav", b"a"),
            Part::File("file", "b.wav", b"b"),
        ]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "error": "Only one file may be uploaded." })
        );
        assert!(uploaded_files(&h).is_empty());
        assert!(h.store.sample(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vendor_upload_failure_is_500_and_keeps_placeholder() {
        let provider = MockTranscriptionProvider::new();
        provider.fail_upload(401, "Invalid API key");
        let h = harness(provider);

        let req = upload_request(&[Part::File("file", "sample.wav", b"x")]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid API key"));

        let rows = h.store.sample(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].transcript.is_none());
        assert_eq!(h.provider.calls().len(), 1);
        assert_eq!(uploaded_files(&h).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn vendor_error_status_is_500_with_its_message() {
        let h = harness(MockTranscriptionProvider::failing_after(1, "Audio file is corrupt"));
        let req = upload_request(&[Part::File("file", "sample.wav", b"x")]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "error": "Audio file is corrupt" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn poll_timeout_is_504() {
        let config = ServerConfig {
            poll_policy: PollPolicy {
                interval: Duration::from_secs(5),
                max_attempts: 2,
                max_wait: Duration::from_secs(60),
            },
            ..ServerConfig::default()
        };
        let h = harness_with(MockTranscriptionProvider::new(), config);
        let req = upload_request(&[Part::File("file", "sample.wav", b"x")]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(json_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn upload_after_shutdown_is_503() {
        let h = harness(MockTranscriptionProvider::new());
        h.server.shutdown().shutdown();
        let req = upload_request(&[Part::File("file", "sample.wav", b"x")]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(h.provider.status_reads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_poll_is_503() {
        let h = harness(MockTranscriptionProvider::new());
        let shutdown = h.server.shutdown().clone();
        let _trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            shutdown.shutdown();
        });

        let req = upload_request(&[Part::File("file", "sample.wav", b"x")]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "error": "transcription cancelled: server is shutting down" })
        );
        assert_eq!(h.provider.status_reads(), 2);
    }

    #[tokio::test]
    async fn body_limit_applies_when_configured() {
        let config = ServerConfig {
            max_upload_bytes: Some(64),
            ..ServerConfig::default()
        };
        let h = harness_with(MockTranscriptionProvider::new(), config);
        let req = upload_request(&[Part::File("file", "big.wav", &[0_u8; 1024])]);
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
        assert!(h.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_db_on_empty_table() {
        let h = harness(MockTranscriptionProvider::new());
        let req = Request::builder().uri("/test-db").body(Body::empty()).unwrap();
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "data": [], "error": null, "message": "Database test" })
        );
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl TranscriptionStore for BrokenStore {
        async fn insert_placeholder(
            &self,
            _new: scribe_store::NewTranscription,
        ) -> scribe_store::Result<scribe_store::TranscriptionRow> {
            Err(StoreError::Internal("database is locked".into()))
        }

        async fn update_result(
            &self,
            _id: scribe_store::RecordId,
            _transcript: Option<String>,
            _duration_seconds: Option<f64>,
        ) -> scribe_store::Result<()> {
            Err(StoreError::Internal("database is locked".into()))
        }

        async fn get(
            &self,
            _id: scribe_store::RecordId,
        ) -> scribe_store::Result<Option<scribe_store::TranscriptionRow>> {
            Ok(None)
        }

        async fn sample(
            &self,
            _limit: u32,
        ) -> scribe_store::Result<Vec<scribe_store::TranscriptionRow>> {
            Err(StoreError::Internal("database is locked".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_surface() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockTranscriptionProvider::new());
        let server = ScribeServer::new(
            ServerConfig {
                upload_dir: dir.path().to_path_buf(),
                ..ServerConfig::default()
            },
            Arc::new(BrokenStore),
            provider.clone(),
        );

        let req = Request::builder().uri("/test-db").body(Body::empty()).unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert!(body["data"].is_null());
        assert_eq!(body["error"], "internal error: database is locked");

        let req = upload_request(&[Part::File("file", "sample.wav", b"x")]);
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(provider.calls().is_empty());
        // The file stays on disk when the row cannot be written.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let h = harness(MockTranscriptionProvider::new());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "mock");
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let h = harness(MockTranscriptionProvider::new());
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let h = harness(MockTranscriptionProvider::new());
        let req = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();
        let resp = h.server.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_binds_and_drains_on_shutdown() {
        let h = harness_with(
            MockTranscriptionProvider::new(),
            ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                ..ServerConfig::default()
            },
        );
        let (addr, handle) = h.server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(h.dir.path().join("uploads").is_dir());

        h.server.shutdown().graceful_shutdown(handle, Some(Duration::from_secs(5))).await;
        assert!(h.server.shutdown().is_shutting_down());
    }
}
