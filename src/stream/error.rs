//! Error types for stream decoding.

use thiserror::Error;

/// A frame could not be turned into a usable event.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The `data:` payload of a frame was not valid JSON, or did not match
    /// the field types expected for its event.
    #[error("invalid payload for '{event}' frame: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that terminate a frame stream.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The byte source failed (connection reset, timeout, ...).
    #[error("stream transport failed: {0}")]
    Transport(String),

    /// A frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The source ended before a terminal `done` or `error` frame arrived.
    #[error("stream ended before a terminal event")]
    Incomplete,
}
