//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading or validating a [`RagChatConfig`](super::RagChatConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
