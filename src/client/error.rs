//! Error types for backend requests.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the RAG backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network connectivity error (DNS, connection refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Backend returned an error response (4xx, 5xx).
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend response doesn't match expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built (bad upload, bad URL).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Local file for upload could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Map a reqwest transport error, keeping timeouts distinct.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout_ms)
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
