//! ragchat - terminal client for retrieval-augmented-generation backends
//!
//! This library provides the streaming frame decoder, the rolling latency
//! aggregator, and the chat, polling and benchmark machinery built on them.

pub mod api;
pub mod bench;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod session;
pub mod stream;
