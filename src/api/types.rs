//! Request and response types for the RAG backend HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body for `POST /query` and `POST /query/stream`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: None,
            max_tokens: None,
        }
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Non-streaming query response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryResponse {
    pub session_id: Option<String>,
    pub answers: Vec<Answer>,
    pub documents: Vec<RetrievedDocument>,
    pub timings: Option<Timings>,
    pub history: Vec<HistoryTurn>,
}

impl QueryResponse {
    /// Text of the first answer, if the backend produced one.
    pub fn first_answer(&self) -> Option<&str> {
        self.answers
            .first()
            .map(|a| a.answer.as_str())
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Answer {
    pub answer: String,
}

/// One turn of server-side conversation history.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// A document chunk returned by retrieval.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetrievedDocument {
    pub content: Option<String>,
    pub meta: serde_json::Map<String, serde_json::Value>,
    pub score: Option<f64>,
}

impl RetrievedDocument {
    /// Human-readable source label (`meta.filename`, then `meta.source`).
    pub fn source(&self) -> &str {
        ["filename", "source"]
            .iter()
            .find_map(|key| self.meta.get(*key).and_then(|v| v.as_str()))
            .unwrap_or("Document")
    }
}

/// Per-request timings reported by the backend, in milliseconds.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Timings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttft_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_per_second: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_estimated: Option<u64>,
}

/// `GET /stats` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StatsResponse {
    pub provider: Option<String>,
    pub sessions: Option<u64>,
    pub timings: BTreeMap<String, TimingStat>,
}

/// Server-side rolling timing summary for one stage.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimingStat {
    pub avg_ms: f64,
    pub p95_ms: f64,
    pub count: u64,
}

/// `GET /documents` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DocumentsResponse {
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DocumentItem {
    pub key: String,
    pub count: u64,
}

/// `POST /ingest` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestResponse {
    pub ingested: u64,
    pub errors: Vec<serde_json::Value>,
}

/// `POST /delete` body. Exactly one selector is populated.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DeleteRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filenames: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
}

impl DeleteRequest {
    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            keys,
            ..Default::default()
        }
    }

    pub fn filenames(filenames: Vec<String>) -> Self {
        Self {
            filenames,
            ..Default::default()
        }
    }

    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.filenames.is_empty() && !self.all
    }
}

/// `POST /delete` response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeleteResponse {
    #[serde(default)]
    pub deleted: Deleted,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Number of removed chunks, or the literal `"all"`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Deleted {
    Count(u64),
    Everything(String),
}

impl Default for Deleted {
    fn default() -> Self {
        Deleted::Count(0)
    }
}

impl std::fmt::Display for Deleted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deleted::Count(n) => write!(f, "{}", n),
            Deleted::Everything(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_omits_absent_session() {
        let body = serde_json::to_value(QueryRequest::new("hello")).unwrap();
        assert_eq!(body, json!({"query": "hello"}));

        let body = serde_json::to_value(
            QueryRequest::new("hello").with_session(Some("s-1".to_string())),
        )
        .unwrap();
        assert_eq!(body, json!({"query": "hello", "session_id": "s-1"}));
    }

    #[test]
    fn test_query_response_first_answer() {
        let resp: QueryResponse = serde_json::from_value(json!({
            "session_id": "abc",
            "answers": [{"answer": "42"}],
            "documents": [{"content": "x", "meta": {"filename": "a.pdf"}, "score": 0.5}],
            "timings": {"retrieval_ms": 1.5, "total_ms": 10.0}
        }))
        .unwrap();
        assert_eq!(resp.first_answer(), Some("42"));
        assert_eq!(resp.documents[0].source(), "a.pdf");
        assert_eq!(resp.timings.unwrap().total_ms, Some(10.0));

        let empty: QueryResponse = serde_json::from_value(json!({"answers": []})).unwrap();
        assert_eq!(empty.first_answer(), None);
    }

    #[test]
    fn test_document_source_fallback() {
        let doc = RetrievedDocument::default();
        assert_eq!(doc.source(), "Document");
    }

    #[test]
    fn test_delete_request_shapes() {
        assert_eq!(
            serde_json::to_value(DeleteRequest::keys(vec!["a".into()])).unwrap(),
            json!({"keys": ["a"]})
        );
        assert_eq!(
            serde_json::to_value(DeleteRequest::all()).unwrap(),
            json!({"all": true})
        );
        assert!(DeleteRequest::default().is_empty());
    }

    #[test]
    fn test_delete_response_count_or_all() {
        let resp: DeleteResponse = serde_json::from_value(json!({"deleted": 3})).unwrap();
        assert_eq!(resp.deleted, Deleted::Count(3));

        let resp: DeleteResponse = serde_json::from_value(json!({"deleted": "all"})).unwrap();
        assert_eq!(resp.deleted.to_string(), "all");

        let resp: DeleteResponse =
            serde_json::from_value(json!({"deleted": 0, "error": "no matching documents"}))
                .unwrap();
        assert_eq!(resp.error.as_deref(), Some("no matching documents"));
    }

    #[test]
    fn test_stats_response_parses_timings() {
        let stats: StatsResponse = serde_json::from_value(json!({
            "provider": "akamai",
            "sessions": 2,
            "timings": {"retrieval": {"avg_ms": 1.0, "p95_ms": 2.0, "count": 3}}
        }))
        .unwrap();
        assert_eq!(stats.timings["retrieval"].count, 3);
        assert_eq!(stats.provider.as_deref(), Some("akamai"));
    }
}
