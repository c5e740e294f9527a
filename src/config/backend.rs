//! Backend connection configuration

use serde::{Deserialize, Serialize};

/// Where the RAG backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub url: String,
    /// Timeout for non-streaming requests (query, stats, ingest, ...)
    pub request_timeout_seconds: u64,
    /// Timeout for establishing a connection, streaming included
    pub connect_timeout_seconds: u64,
    /// Use `/query/stream` by default
    pub stream: bool,
    /// Optional generation cap forwarded as `max_tokens`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            request_timeout_seconds: 120,
            connect_timeout_seconds: 10,
            stream: true,
            max_tokens: None,
        }
    }
}
