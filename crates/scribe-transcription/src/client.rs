//! HTTP client for the AssemblyAI v2 API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use crate::provider::TranscriptionProvider;
use crate::types::{ResultExt, TranscriptId, TranscriptStatus, TranscriptionError};

/// Connection parameters for [`AssemblyAiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.assemblyai.com`.
    pub base_url: String,
    /// Value sent in the `authorization` header.
    pub api_key: String,
    /// Connect timeout, and the whole-request timeout for the JSON calls.
    ///
    /// Audio uploads are bounded by the connect timeout only, so large files
    /// on slow links are not cut off.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Deserialize)]
struct CreatedTranscript {
    id: TranscriptId,
}

/// [`TranscriptionProvider`] speaking the AssemblyAI protocol.
pub struct AssemblyAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

impl AssemblyAiClient {
    /// Build a client with its own connection pool.
    pub fn new(config: ClientConfig) -> Result<Self, TranscriptionError> {
        let http = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            request_timeout: config.request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Fail on non-2xx, keeping whatever body the vendor sent.
async fn check_status(response: Response) -> Result<Response, TranscriptionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TranscriptionError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_body<T: DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, TranscriptionError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).decode(context)
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiClient {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn upload_audio(&self, path: &Path) -> Result<String, TranscriptionError> {
        let file = tokio::fs::File::open(path).await?;
        let response = self
            .http
            .post(self.url("/v2/upload"))
            .header(AUTHORIZATION, &self.api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        let response = check_status(response).await?;
        let uploaded: UploadResponse = decode_body(response, "upload response").await?;
        debug!(upload_url = %uploaded.upload_url, "audio uploaded");
        Ok(uploaded.upload_url)
    }

    #[instrument(skip(self))]
    async fn create_transcript(&self, audio_url: &str) -> Result<TranscriptId, TranscriptionError> {
        let response = self
            .http
            .post(self.url("/v2/transcript"))
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, &self.api_key)
            .json(&serde_json::json!({ "audio_url": audio_url }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let created: CreatedTranscript = decode_body(response, "transcript response").await?;
        debug!(transcript_id = %created.id, "transcript job created");
        Ok(created.id)
    }

    #[instrument(skip(self), fields(transcript_id = %id))]
    async fn get_transcript(
        &self,
        id: &TranscriptId,
    ) -> Result<TranscriptStatus, TranscriptionError> {
        let response = self
            .http
            .get(self.url(&format!("/v2/transcript/{id}")))
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await?;
        let response = check_status(response).await?;
        decode_body(response, "transcript status").await
    }

    fn provider_id(&self) -> &str {
        "assemblyai"
    }
}
