//! Per-request streaming state.
//!
//! [`RequestState`] is a plain value: [`RequestState::apply`] consumes it
//! together with one event and hands back either the next state or the
//! finished [`Completion`]. Nothing is shared or mutated across suspension
//! points.

use crate::api::types::{RetrievedDocument, Timings};
use crate::metrics::MetricsSample;
use crate::stream::{DoneEvent, ErrorEvent, MetaEvent, StreamEvent};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Identifiers reported by the backend for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestIdentity {
    pub request_id: Option<String>,
    pub session_id: Option<String>,
    pub replica_id: Option<String>,
    pub model_id: Option<String>,
    pub k: Option<u32>,
}

impl RequestIdentity {
    /// Overwrite fields the event actually carries.
    fn merge(&mut self, other: RequestIdentity) {
        if other.request_id.is_some() {
            self.request_id = other.request_id;
        }
        if other.session_id.is_some() {
            self.session_id = other.session_id;
        }
        if other.replica_id.is_some() {
            self.replica_id = other.replica_id;
        }
        if other.model_id.is_some() {
            self.model_id = other.model_id;
        }
        if other.k.is_some() {
            self.k = other.k;
        }
    }
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed { message: String },
}

/// In-flight request state.
#[derive(Debug, Clone)]
pub struct RequestState {
    client_request_id: String,
    started_at: Instant,
    answer: String,
    first_token_at: Option<Instant>,
    last_token_at: Option<Instant>,
    token_count: u64,
    identity: RequestIdentity,
    documents: Vec<RetrievedDocument>,
    server_ttft_ms: Option<f64>,
    retrieval_ms: Option<f64>,
}

/// Result of applying one event.
#[derive(Debug)]
pub enum Transition {
    Pending(RequestState),
    Finished(Completion),
}

/// Everything known about a request once it reached `done` or `error`.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub outcome: Outcome,
    pub answer: String,
    pub identity: RequestIdentity,
    pub documents: Vec<RetrievedDocument>,
    /// Merged server timings (retrieval from `meta`, the rest from `done`)
    pub timings: Timings,
    pub sample: MetricsSample,
    /// Token events seen by the client
    pub token_count: u64,
    /// Token count reported by the server on `done`
    pub server_token_count: Option<u64>,
    pub prompt_tokens: Option<u64>,
    /// Client-measured time to first token
    #[serde(skip)]
    pub client_ttft: Option<Duration>,
    /// Client-measured time from first to last token
    #[serde(skip)]
    pub generation_span: Option<Duration>,
    /// Client-measured time from request start to the terminal event
    #[serde(skip)]
    pub elapsed: Duration,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl RequestState {
    /// Fresh state for a request issued at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self {
            client_request_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            answer: String::new(),
            first_token_at: None,
            last_token_at: None,
            token_count: 0,
            identity: RequestIdentity::default(),
            documents: Vec::new(),
            server_ttft_ms: None,
            retrieval_ms: None,
        }
    }

    /// Server request id when known, otherwise the client-generated one.
    pub fn request_id(&self) -> &str {
        self.identity
            .request_id
            .as_deref()
            .unwrap_or(&self.client_request_id)
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn token_count(&self) -> u64 {
        self.token_count
    }

    pub fn identity(&self) -> &RequestIdentity {
        &self.identity
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Apply one event observed at `now`.
    pub fn apply(mut self, event: StreamEvent, now: Instant) -> Transition {
        match event {
            StreamEvent::Token(token) => {
                self.first_token_at.get_or_insert(now);
                self.last_token_at = Some(now);
                self.token_count += 1;
                self.answer.push_str(&token.text);
                Transition::Pending(self)
            }
            StreamEvent::Meta(meta) => {
                self.apply_meta(meta);
                Transition::Pending(self)
            }
            StreamEvent::Ttft(ttft) => {
                if ttft.ttft_ms.is_some() {
                    self.server_ttft_ms = ttft.ttft_ms;
                }
                self.identity.merge(RequestIdentity {
                    request_id: ttft.request_id,
                    session_id: ttft.session_id,
                    ..Default::default()
                });
                Transition::Pending(self)
            }
            StreamEvent::Done(done) => Transition::Finished(self.finish_done(done, now)),
            StreamEvent::Error(error) => Transition::Finished(self.finish_error(error, now)),
            StreamEvent::Unknown { event, .. } => {
                tracing::debug!(event = %event, "ignoring unknown stream event");
                Transition::Pending(self)
            }
        }
    }

    fn apply_meta(&mut self, meta: MetaEvent) {
        self.identity.merge(RequestIdentity {
            request_id: meta.request_id,
            session_id: meta.session_id,
            replica_id: meta.replica_id,
            model_id: meta.model_id,
            k: meta.k,
        });
        self.documents = meta.documents;
        if meta.timings.retrieval_ms.is_some() {
            self.retrieval_ms = meta.timings.retrieval_ms;
        }
    }

    fn client_ttft(&self) -> Option<Duration> {
        self.first_token_at
            .map(|t| t.saturating_duration_since(self.started_at))
    }

    fn generation_span(&self) -> Option<Duration> {
        match (self.first_token_at, self.last_token_at) {
            (Some(first), Some(last)) => Some(last.saturating_duration_since(first)),
            _ => None,
        }
    }

    /// Server TTFT when reported, else client-measured.
    fn ttft_ms(&self) -> Option<f64> {
        self.server_ttft_ms.or_else(|| self.client_ttft().map(millis))
    }

    fn client_tokens_per_sec(&self) -> Option<f64> {
        let span = self.generation_span()?.as_secs_f64();
        if span > 0.0 && self.token_count > 0 {
            Some(self.token_count as f64 / span)
        } else {
            None
        }
    }

    fn finish_done(mut self, done: DoneEvent, now: Instant) -> Completion {
        let elapsed = now.saturating_duration_since(self.started_at);
        self.identity.merge(RequestIdentity {
            request_id: done.request_id,
            session_id: done.session_id,
            replica_id: done.replica_id,
            model_id: done.model_id,
            k: done.k,
        });
        if !done.documents.is_empty() || self.documents.is_empty() {
            self.documents = done.documents;
        }

        let ttft_ms = done.timings.ttft_ms.or_else(|| self.ttft_ms());
        let total_ms = done.timings.total_ms.or(Some(millis(elapsed)));
        let tokens_per_sec = done
            .tokens_per_sec
            .or(done.timings.tokens_per_second)
            .or_else(|| self.client_tokens_per_sec());

        let sample = MetricsSample::success(self.request_id())
            .with_ttft_ms(ttft_ms)
            .with_total_ms(total_ms)
            .with_tokens_per_sec(tokens_per_sec);

        let mut timings = done.timings;
        if timings.retrieval_ms.is_none() {
            timings.retrieval_ms = self.retrieval_ms;
        }
        if timings.ttft_ms.is_none() {
            timings.ttft_ms = ttft_ms;
        }

        Completion {
            outcome: Outcome::Succeeded,
            client_ttft: self.client_ttft(),
            generation_span: self.generation_span(),
            answer: self.answer,
            identity: self.identity,
            documents: self.documents,
            timings,
            sample,
            token_count: self.token_count,
            server_token_count: done.token_count,
            prompt_tokens: done.prompt_tokens,
            elapsed,
        }
    }

    fn finish_error(mut self, error: ErrorEvent, now: Instant) -> Completion {
        let elapsed = now.saturating_duration_since(self.started_at);
        let message = error.message().to_string();
        self.identity.merge(RequestIdentity {
            request_id: error.request_id,
            session_id: error.session_id,
            ..Default::default()
        });

        let ttft_ms = self.ttft_ms();
        let sample = MetricsSample::failure(self.request_id())
            .with_ttft_ms(ttft_ms)
            .with_total_ms(Some(millis(elapsed)));

        Completion {
            outcome: Outcome::Failed { message },
            client_ttft: self.client_ttft(),
            generation_span: self.generation_span(),
            answer: self.answer,
            identity: self.identity,
            documents: self.documents,
            timings: Timings {
                retrieval_ms: self.retrieval_ms,
                ttft_ms,
                ..Default::default()
            },
            sample,
            token_count: self.token_count,
            server_token_count: None,
            prompt_tokens: None,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{TokenEvent, TtftEvent};

    fn token(text: &str) -> StreamEvent {
        StreamEvent::Token(TokenEvent {
            text: text.to_string(),
        })
    }

    fn pending(t: Transition) -> RequestState {
        match t {
            Transition::Pending(state) => state,
            Transition::Finished(c) => panic!("unexpected completion: {:?}", c),
        }
    }

    fn finished(t: Transition) -> Completion {
        match t {
            Transition::Finished(c) => c,
            Transition::Pending(_) => panic!("expected completion"),
        }
    }

    #[test]
    fn test_tokens_accumulate_and_first_token_is_set_once() {
        let start = Instant::now();
        let state = RequestState::new(start);
        let state = pending(state.apply(token("He"), start + Duration::from_millis(100)));
        let state = pending(state.apply(token("llo"), start + Duration::from_millis(300)));

        assert_eq!(state.answer(), "Hello");
        assert_eq!(state.token_count(), 2);
        assert_eq!(state.client_ttft(), Some(Duration::from_millis(100)));
        assert_eq!(state.generation_span(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_done_prefers_server_timings() {
        let start = Instant::now();
        let state = pending(RequestState::new(start).apply(token("Hi"), start));
        let done = DoneEvent {
            timings: Timings {
                total_ms: Some(42.0),
                ttft_ms: Some(7.0),
                ..Default::default()
            },
            tokens_per_sec: Some(12.5),
            request_id: Some("req-1".to_string()),
            ..Default::default()
        };
        let completion = finished(
            state.apply(StreamEvent::Done(done), start + Duration::from_secs(1)),
        );

        assert!(completion.is_success());
        assert_eq!(completion.answer, "Hi");
        assert_eq!(completion.sample.request_id, "req-1");
        assert_eq!(completion.sample.total_ms, Some(42.0));
        assert_eq!(completion.sample.ttft_ms, Some(7.0));
        assert_eq!(completion.sample.tokens_per_sec, Some(12.5));
        assert!(completion.sample.success);
    }

    #[test]
    fn test_done_falls_back_to_client_measurements() {
        let start = Instant::now();
        let state = RequestState::new(start);
        let state = pending(state.apply(token("a"), start + Duration::from_millis(200)));
        let state = pending(state.apply(token("b"), start + Duration::from_millis(400)));
        let state = pending(state.apply(token("c"), start + Duration::from_millis(700)));
        let completion = finished(state.apply(
            StreamEvent::Done(DoneEvent::default()),
            start + Duration::from_millis(1000),
        ));

        assert_eq!(completion.sample.ttft_ms, Some(200.0));
        assert_eq!(completion.sample.total_ms, Some(1000.0));
        // 3 tokens over 0.5s between first and last
        let tps = completion.sample.tokens_per_sec.unwrap();
        assert!((tps - 6.0).abs() < 1e-9);
        // generated id is used when the server sends none
        assert!(!completion.sample.request_id.is_empty());
    }

    #[test]
    fn test_ttft_event_then_done_without_ttft() {
        let start = Instant::now();
        let state = RequestState::new(start);
        let state = pending(state.apply(
            StreamEvent::Ttft(TtftEvent {
                ttft_ms: Some(55.0),
                ..Default::default()
            }),
            start,
        ));
        let completion = finished(state.apply(StreamEvent::Done(DoneEvent::default()), start));
        assert_eq!(completion.sample.ttft_ms, Some(55.0));
    }

    #[test]
    fn test_meta_updates_identity_and_documents() {
        let start = Instant::now();
        let meta = MetaEvent {
            session_id: Some("sess".to_string()),
            request_id: Some("r-9".to_string()),
            replica_id: Some("replica-a".to_string()),
            model_id: Some("llama".to_string()),
            k: Some(1),
            documents: vec![RetrievedDocument::default()],
            timings: Timings {
                retrieval_ms: Some(8.0),
                ..Default::default()
            },
        };
        let state = pending(RequestState::new(start).apply(StreamEvent::Meta(meta), start));
        assert_eq!(state.request_id(), "r-9");
        assert_eq!(state.identity().k, Some(1));

        // done without documents keeps the meta documents and retrieval timing
        let completion = finished(state.apply(StreamEvent::Done(DoneEvent::default()), start));
        assert_eq!(completion.documents.len(), 1);
        assert_eq!(completion.timings.retrieval_ms, Some(8.0));
        assert_eq!(completion.identity.session_id.as_deref(), Some("sess"));
        assert_eq!(completion.identity.replica_id.as_deref(), Some("replica-a"));
    }

    #[test]
    fn test_error_event_finishes_with_failure_sample() {
        let start = Instant::now();
        let state = pending(RequestState::new(start).apply(token("par"), start));
        let completion = finished(state.apply(
            StreamEvent::Error(ErrorEvent {
                message: Some("Streaming failed".to_string()),
                ..Default::default()
            }),
            start + Duration::from_millis(50),
        ));

        assert!(!completion.is_success());
        assert_eq!(
            completion.outcome,
            Outcome::Failed {
                message: "Streaming failed".to_string()
            }
        );
        assert!(!completion.sample.success);
        assert_eq!(completion.sample.total_ms, Some(50.0));
        assert_eq!(completion.answer, "par");
    }

    #[test]
    fn test_unknown_event_is_inert() {
        let start = Instant::now();
        let state = RequestState::new(start);
        let before = state.clone();
        let state = pending(state.apply(
            StreamEvent::Unknown {
                event: "message".to_string(),
                data: serde_json::json!({"text": "ab"}),
            },
            start,
        ));
        assert_eq!(state.answer(), before.answer());
        assert_eq!(state.token_count(), 0);
        assert_eq!(state.identity(), before.identity());
    }
}
