//! HTTP client for the RAG backend.
//!
//! Wraps a pooled `reqwest::Client` and exposes one method per endpoint.
//! Streaming queries return a [`FrameStream`] fed by the incremental decoder;
//! everything else returns the typed response body.
//!
//! No request is retried: every failure is returned to the caller as a
//! [`ClientError`].

pub mod error;

pub use error::ClientError;

use crate::api::types::{
    DeleteRequest, DeleteResponse, DocumentsResponse, IngestResponse, QueryRequest,
    QueryResponse, StatsResponse,
};
use crate::config::BackendConfig;
use crate::poller::SnapshotSource;
use crate::stream::{decode_stream, FrameStream};
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client for one RAG backend.
#[derive(Debug, Clone)]
pub struct RagClient {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl RagClient {
    /// Build a client from backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        Ok(Self::with_client(
            &config.url,
            client,
            Duration::from_secs(config.request_timeout_seconds),
        ))
    }

    /// Create a client around an existing HTTP client (for testing).
    pub fn with_client(base_url: &str, client: reqwest::Client, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn timeout_ms(&self) -> u64 {
        self.request_timeout.as_millis() as u64
    }

    /// Send a request and fail on non-2xx status.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_ms()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::info!(status = %status, "backend returned error status");
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self
            .send(request.timeout(self.request_timeout))
            .await?
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_ms()))?;

        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// `POST /query`: non-streaming answer.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        tracing::debug!(url = %self.base_url, "sending query");
        self.json(self.client.post(self.url("/query")).json(request))
            .await
    }

    /// `POST /query/stream`: decoded frame stream.
    ///
    /// Only connection setup and the response status are checked here; body
    /// failures surface as error items on the returned stream. No overall
    /// timeout is applied to the body, generation can legitimately run long.
    pub async fn query_stream(&self, request: &QueryRequest) -> Result<FrameStream, ClientError> {
        let response = self
            .send(self.client.post(self.url("/query/stream")).json(request))
            .await?;

        tracing::debug!(url = %self.base_url, "streaming query started");
        Ok(decode_stream(response.bytes_stream()).boxed())
    }

    /// `GET /stats`: server-side timing summaries.
    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.json(self.client.get(self.url("/stats"))).await
    }

    /// `GET /documents`: ingested sources and chunk counts.
    pub async fn documents(&self) -> Result<DocumentsResponse, ClientError> {
        self.json(self.client.get(self.url("/documents"))).await
    }

    /// `POST /ingest`: upload files as multipart field `files`.
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<IngestResponse, ClientError> {
        if paths.is_empty() {
            return Err(ClientError::InvalidRequest(
                "select files to ingest".to_string(),
            ));
        }

        let mut form = reqwest::multipart::Form::new();
        for path in paths {
            form = form.part("files", file_part(path).await?);
        }

        tracing::info!(files = paths.len(), "uploading documents");
        self.json(self.client.post(self.url("/ingest")).multipart(form))
            .await
    }

    /// `POST /delete`: remove documents by key, filename, or all.
    pub async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse, ClientError> {
        if request.is_empty() {
            return Err(ClientError::InvalidRequest(
                "delete needs keys, filenames, or all".to_string(),
            ));
        }
        self.json(self.client.post(self.url("/delete")).json(request))
            .await
    }
}

async fn file_part(path: &Path) -> Result<reqwest::multipart::Part, ClientError> {
    let data = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    reqwest::multipart::Part::bytes(data)
        .file_name(file_name)
        .mime_str(mime.essence_str())
        .map_err(|e| ClientError::InvalidRequest(e.to_string()))
}

#[async_trait]
impl SnapshotSource for RagClient {
    async fn fetch_stats(&self) -> Result<StatsResponse, ClientError> {
        self.stats().await
    }

    async fn fetch_documents(&self) -> Result<DocumentsResponse, ClientError> {
        self.documents().await
    }
}
