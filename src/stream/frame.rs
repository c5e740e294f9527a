//! Raw frame representation and wire parsing.

use super::error::DecodeError;
use serde::{Deserialize, Serialize};

/// Event name used when a frame carries no `event:` line.
pub const DEFAULT_EVENT: &str = "message";

/// One named event with its JSON payload, as extracted from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    pub data: serde_json::Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Encode the frame in `event:`/`data:` wire form, including the
    /// trailing blank-line separator.
    ///
    /// [`parse`](Self::parse) restores the frame only when the event name is
    /// non-empty, has no leading or trailing whitespace and holds no line
    /// break. An empty name decodes as [`DEFAULT_EVENT`], surrounding
    /// whitespace is trimmed, and a `\n` ends the `event:` line early.
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event, self.data)
    }

    /// Parse the text of a single frame (without its `\n\n` separator).
    ///
    /// Returns `Ok(None)` for frames without a `data:` line (keep-alives,
    /// comments, empty frames). Only the last `event:` and `data:` lines are
    /// honored.
    pub fn parse(raw: &str) -> Result<Option<Self>, DecodeError> {
        let mut event: Option<&str> = None;
        let mut data: Option<&str> = None;

        for line in raw.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(value) = line.strip_prefix("event:") {
                event = Some(value.trim());
            } else if let Some(value) = line.strip_prefix("data:") {
                data = Some(value.trim());
            }
        }

        let event = match event {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_EVENT,
        };

        let data = match data {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(None),
        };

        let value =
            serde_json::from_str(data).map_err(|source| DecodeError::InvalidPayload {
                event: event.to_string(),
                source,
            })?;

        Ok(Some(Frame::new(event, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_event_and_data() {
        let frame = Frame::parse("event: token\ndata: {\"text\":\"Hi\"}")
            .unwrap()
            .unwrap();
        assert_eq!(frame.event, "token");
        assert_eq!(frame.data, json!({"text": "Hi"}));
    }

    #[test]
    fn test_parse_defaults_event_to_message() {
        let frame = Frame::parse("data: {\"text\":\"ab\"}").unwrap().unwrap();
        assert_eq!(frame.event, "message");
        assert_eq!(frame.data["text"], "ab");
    }

    #[test]
    fn test_parse_without_data_yields_nothing() {
        assert!(Frame::parse("event: ping").unwrap().is_none());
        assert!(Frame::parse(": keep-alive").unwrap().is_none());
        assert!(Frame::parse("").unwrap().is_none());
        assert!(Frame::parse("event: token\ndata:").unwrap().is_none());
    }

    #[test]
    fn test_parse_last_occurrence_wins() {
        let raw = "event: meta\nevent: done\ndata: {\"a\":1}\ndata: {\"a\":2}";
        let frame = Frame::parse(raw).unwrap().unwrap();
        assert_eq!(frame.event, "done");
        assert_eq!(frame.data, json!({"a": 2}));
    }

    #[test]
    fn test_parse_tolerates_carriage_returns() {
        let frame = Frame::parse("event: ttft\r\ndata: {\"ttft_ms\":12.5}\r")
            .unwrap()
            .unwrap();
        assert_eq!(frame.event, "ttft");
        assert_eq!(frame.data["ttft_ms"], 12.5);
    }

    #[test]
    fn test_parse_invalid_json_is_error() {
        let err = Frame::parse("event: token\ndata: {not json").unwrap_err();
        match err {
            DecodeError::InvalidPayload { event, .. } => assert_eq!(event, "token"),
        }
    }

    #[test]
    fn test_encode_then_parse() {
        let frame = Frame::new("done", json!({"timings": {"total_ms": 42}}));
        let wire = frame.encode();
        assert!(wire.ends_with("\n\n"));
        let parsed = Frame::parse(wire.trim_end_matches('\n')).unwrap().unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_encode_lossy_event_names() {
        let reparse = |name: &str| {
            let wire = Frame::new(name, json!({"n": 1})).encode();
            Frame::parse(wire.trim_end_matches('\n')).unwrap().unwrap()
        };

        assert_eq!(reparse("").event, DEFAULT_EVENT);
        assert_eq!(reparse("  meta ").event, "meta");

        let split = reparse("a\nb");
        assert_eq!(split.event, "a");
        assert_eq!(split.data, json!({"n": 1}));
    }
}
