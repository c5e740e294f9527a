use crate::client::ClientError;
use crate::stream::StreamError;
use thiserror::Error;

/// Errors surfaced by [`ChatSession`](super::ChatSession) operations.
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("select files to ingest")]
    NoFiles,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}
