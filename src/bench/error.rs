use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a benchmark run. Per-request failures are recorded in
/// the results instead.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Invalid benchmark settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to read prompt file {path}: {source}")]
    PromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write results to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}
