//! Wire types for the RAG backend HTTP API.

pub mod types;
