//! Typed view of decoded frames.
//!
//! Each known event name maps to a variant with a fixed field set. Wire
//! payloads routinely omit or null fields, so every field is optional or
//! defaulted; a field present with the wrong JSON type is a decode error.
//! Unrecognized event names become [`StreamEvent::Unknown`], which dispatch
//! ignores.

use super::error::DecodeError;
use super::frame::Frame;
use crate::api::types::{RetrievedDocument, Timings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenEvent {
    pub text: String,
}

/// Retrieval results and request identity, sent before generation starts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetaEvent {
    pub documents: Vec<RetrievedDocument>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub replica_id: Option<String>,
    pub model_id: Option<String>,
    pub k: Option<u32>,
    pub timings: Timings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TtftEvent {
    pub ttft_ms: Option<f64>,
    pub request_id: Option<String>,
    pub session_id: Option<String>,
}

/// Terminal success with final timings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DoneEvent {
    pub documents: Vec<RetrievedDocument>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub replica_id: Option<String>,
    pub model_id: Option<String>,
    pub k: Option<u32>,
    pub timings: Timings,
    pub token_count: Option<u64>,
    pub prompt_tokens: Option<u64>,
    pub tokens_per_sec: Option<f64>,
}

/// Terminal failure reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorEvent {
    pub message: Option<String>,
    pub request_id: Option<String>,
    pub session_id: Option<String>,
}

impl ErrorEvent {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("Streaming failed")
    }
}

/// A decoded frame, keyed by event name.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token(TokenEvent),
    Meta(MetaEvent),
    Ttft(TtftEvent),
    Done(DoneEvent),
    Error(ErrorEvent),
    Unknown {
        event: String,
        data: serde_json::Value,
    },
}

impl StreamEvent {
    /// Convert a raw frame into its typed variant.
    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        let Frame { event, data } = frame;
        let parsed = match event.as_str() {
            "token" => serde_json::from_value(data).map(StreamEvent::Token),
            "meta" => serde_json::from_value(data).map(StreamEvent::Meta),
            "ttft" => serde_json::from_value(data).map(StreamEvent::Ttft),
            "done" => serde_json::from_value(data).map(StreamEvent::Done),
            "error" => serde_json::from_value(data).map(StreamEvent::Error),
            _ => return Ok(StreamEvent::Unknown { event, data }),
        };
        parsed.map_err(|source| DecodeError::InvalidPayload { event, source })
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &str {
        match self {
            StreamEvent::Token(_) => "token",
            StreamEvent::Meta(_) => "meta",
            StreamEvent::Ttft(_) => "ttft",
            StreamEvent::Done(_) => "done",
            StreamEvent::Error(_) => "error",
            StreamEvent::Unknown { event, .. } => event,
        }
    }

    /// True for `done` and `error`, after which no further events matter.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done(_) | StreamEvent::Error(_))
    }
}

impl TryFrom<Frame> for StreamEvent {
    type Error = DecodeError;

    fn try_from(frame: Frame) -> Result<Self, DecodeError> {
        StreamEvent::from_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_event() {
        let event = StreamEvent::from_frame(Frame::new("token", json!({"text": "Hi"}))).unwrap();
        assert_eq!(
            event,
            StreamEvent::Token(TokenEvent {
                text: "Hi".to_string()
            })
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_done_event_with_nulls() {
        let event = StreamEvent::from_frame(Frame::new(
            "done",
            json!({
                "documents": [],
                "timings": {"ttft_ms": null, "total_ms": 42},
                "tokens_per_sec": null,
                "token_count": 3
            }),
        ))
        .unwrap();
        match event {
            StreamEvent::Done(done) => {
                assert_eq!(done.timings.total_ms, Some(42.0));
                assert_eq!(done.timings.ttft_ms, None);
                assert_eq!(done.token_count, Some(3));
            }
            other => panic!("expected done, got {:?}", other),
        }
    }

    #[test]
    fn test_meta_event_fields() {
        let event = StreamEvent::from_frame(Frame::new(
            "meta",
            json!({
                "session_id": "s", "request_id": "r", "replica_id": "pod-1",
                "model_id": "m", "k": 2,
                "documents": [{"content": "a"}, {"content": "b"}],
                "timings": {"retrieval_ms": 3.5}
            }),
        ))
        .unwrap();
        match event {
            StreamEvent::Meta(meta) => {
                assert_eq!(meta.k, Some(2));
                assert_eq!(meta.documents.len(), 2);
                assert_eq!(meta.timings.retrieval_ms, Some(3.5));
                assert_eq!(meta.replica_id.as_deref(), Some("pod-1"));
            }
            other => panic!("expected meta, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_preserved() {
        let event =
            StreamEvent::from_frame(Frame::new("message", json!({"text": "ab"}))).unwrap();
        assert_eq!(event.name(), "message");
        assert!(matches!(event, StreamEvent::Unknown { .. }));
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        let err = StreamEvent::from_frame(Frame::new("token", json!({"text": 5}))).unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_error_event_default_message() {
        let event = StreamEvent::from_frame(Frame::new("error", json!({}))).unwrap();
        match event {
            StreamEvent::Error(e) => assert_eq!(e.message(), "Streaming failed"),
            other => panic!("expected error, got {:?}", other),
        }
    }
}
