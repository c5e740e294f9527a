//! Shared test utilities for ragchat integration tests.
//!
//! Helpers for building streamed response bodies and clients pointed at a
//! `wiremock` backend.

#![allow(dead_code)]

use ragchat::client::RagClient;
use ragchat::metrics::RollingMetrics;
use ragchat::session::ChatSession;
use ragchat::stream::Frame;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Stream Bodies
// =============================================================================

/// Encode frames as a streamed response body.
pub fn stream_body(frames: &[Frame]) -> String {
    frames.iter().map(Frame::encode).collect()
}

/// Token frames for each piece of text, then `done` with the given payload.
pub fn answer_frames(tokens: &[&str], done: Value) -> Vec<Frame> {
    let mut frames: Vec<Frame> = tokens
        .iter()
        .map(|t| Frame::new("token", json!({ "text": t })))
        .collect();
    frames.push(Frame::new("done", done));
    frames
}

/// Body of the canonical two-frame exchange: token "Hi", done total_ms 42.
pub fn hi_body() -> String {
    "event: token\ndata: {\"text\":\"Hi\"}\n\nevent: done\ndata: {\"documents\":[],\"timings\":{\"total_ms\":42}}\n\n"
        .to_string()
}

// =============================================================================
// Mock Backend
// =============================================================================

/// Mount a `/query/stream` response with the given body.
pub async fn mount_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/query/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a JSON response for `method path`.
pub async fn mount_json(server: &MockServer, http_method: &str, route: &str, body: Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// Clients
// =============================================================================

pub fn client_for(server: &MockServer) -> RagClient {
    RagClient::with_client(&server.uri(), reqwest::Client::new(), Duration::from_secs(5))
}

pub fn session_for(server: &MockServer) -> (ChatSession, Arc<RollingMetrics>) {
    let metrics = Arc::new(RollingMetrics::new());
    let session = ChatSession::new(client_for(server), Arc::clone(&metrics));
    (session, metrics)
}
