//! Conversation state for one interactive user.

use super::dispatch::drive;
use super::documents::DocumentIndex;
use super::error::ChatError;
use super::state::{Completion, Outcome, RequestState};
use crate::api::types::{
    DeleteRequest, DeleteResponse, IngestResponse, QueryRequest, RetrievedDocument, Timings,
};
use crate::client::RagClient;
use crate::logging::content_preview;
use crate::metrics::RollingMetrics;
use crate::stream::StreamEvent;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

const NO_ANSWER: &str = "No answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A chat against one backend.
///
/// Holds the transcript, the server session id, what the last answer was
/// grounded on, and a status line. Streaming outcomes are recorded into the
/// shared [`RollingMetrics`].
pub struct ChatSession {
    client: RagClient,
    metrics: Arc<RollingMetrics>,
    session_id: Option<String>,
    messages: Vec<ChatMessage>,
    last_timings: Option<Timings>,
    last_documents: Vec<RetrievedDocument>,
    documents: DocumentIndex,
    status: String,
    max_tokens: Option<u32>,
    content_preview: Option<usize>,
}

impl ChatSession {
    pub fn new(client: RagClient, metrics: Arc<RollingMetrics>) -> Self {
        Self {
            client,
            metrics,
            session_id: None,
            messages: Vec::new(),
            last_timings: None,
            last_documents: Vec::new(),
            documents: DocumentIndex::new(),
            status: String::new(),
            max_tokens: None,
            content_preview: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Include query and answer previews of at most `limit` characters in
    /// log events. `None` keeps content out of the logs.
    pub fn with_content_preview(mut self, limit: Option<usize>) -> Self {
        self.content_preview = limit;
        self
    }

    /// Continue an existing server-side session.
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_timings(&self) -> Option<&Timings> {
        self.last_timings.as_ref()
    }

    pub fn last_documents(&self) -> &[RetrievedDocument] {
        &self.last_documents
    }

    pub fn documents(&self) -> &DocumentIndex {
        &self.documents
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn metrics(&self) -> &Arc<RollingMetrics> {
        &self.metrics
    }

    pub fn client(&self) -> &RagClient {
        &self.client
    }

    /// Forget the transcript and start a new server session on the next query.
    pub fn reset(&mut self) {
        self.session_id = None;
        self.messages.clear();
        self.last_timings = None;
        self.last_documents.clear();
        self.status.clear();
    }

    /// Ask over `/query/stream`, calling `on_token` for every token as it
    /// arrives.
    ///
    /// Only a terminal event records a metrics sample. A server `error`
    /// event is a normal outcome: it is returned as a [`Completion`] whose
    /// outcome is failed and recorded with `success = false`. Transport
    /// failures, undecodable frames and bodies that end early are returned
    /// as errors and surfaced through the status line only.
    pub async fn ask_streaming<F>(
        &mut self,
        query: &str,
        mut on_token: F,
    ) -> Result<Completion, ChatError>
    where
        F: FnMut(&str),
    {
        let query = self.begin(query)?;
        let request = QueryRequest::new(query)
            .with_session(self.session_id.clone())
            .with_max_tokens(self.max_tokens);
        let state = RequestState::new(Instant::now());

        let frames = match self.client.query_stream(&request).await {
            Ok(frames) => frames,
            Err(e) => return Err(self.fail(e.into())),
        };

        let result = drive(frames, state, Instant::now, |event| {
            if let StreamEvent::Token(token) = event {
                on_token(&token.text);
            }
        })
        .await;

        match result {
            Ok(completion) => {
                self.metrics.record(completion.sample.clone());
                self.finish(&completion);
                Ok(completion)
            }
            Err(interrupted) => {
                tracing::warn!(
                    request_id = interrupted.partial.request_id(),
                    tokens = interrupted.partial.token_count(),
                    incomplete = interrupted.is_incomplete(),
                    "stream interrupted before a terminal event"
                );
                Err(self.fail(interrupted.error.into()))
            }
        }
    }

    /// Ask over `/query` and return the first answer.
    ///
    /// Non-streaming answers carry no token timing, so nothing is recorded
    /// into the metrics window.
    pub async fn ask(&mut self, query: &str) -> Result<String, ChatError> {
        let query = self.begin(query)?;
        let request = QueryRequest::new(query).with_session(self.session_id.clone());

        let response = match self.client.query(&request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };

        let answer = response.first_answer().unwrap_or(NO_ANSWER).to_string();
        if response.session_id.is_some() {
            self.session_id = response.session_id;
        }
        self.last_documents = response.documents;
        self.last_timings = response.timings;
        self.push(Role::Assistant, &answer);
        self.status = "Ready".to_string();
        Ok(answer)
    }

    /// Upload files, then refresh the document listing.
    pub async fn ingest(&mut self, paths: &[PathBuf]) -> Result<IngestResponse, ChatError> {
        if paths.is_empty() {
            self.status = "Select files to ingest.".to_string();
            return Err(ChatError::NoFiles);
        }
        self.status = "Uploading...".to_string();

        let response = match self.client.ingest(paths).await {
            Ok(response) => response,
            Err(e) => {
                self.status = format!("Ingest failed: {}", e);
                return Err(e.into());
            }
        };
        self.status = format!("Ingested {} files.", response.ingested);

        if let Err(e) = self.refresh_documents().await {
            tracing::warn!(error = %e, "document listing refresh failed after ingest");
            // Uploads are keyed by filename; a lone file owns every chunk.
            if let [path] = paths {
                if let Some(name) = path.file_name() {
                    self.documents
                        .record_ingest(name.to_string_lossy(), response.ingested);
                }
            }
        }

        Ok(response)
    }

    /// Delete documents and drop them from the local index.
    pub async fn delete(&mut self, request: &DeleteRequest) -> Result<DeleteResponse, ChatError> {
        let response = match self.client.delete(request).await {
            Ok(response) => response,
            Err(e) => {
                self.status = format!("Delete failed: {}", e);
                return Err(e.into());
            }
        };

        match &response.error {
            Some(message) => self.status = format!("Delete failed: {}", message),
            None => {
                if request.all {
                    self.documents.clear();
                } else {
                    self.documents
                        .remove(request.keys.iter().chain(request.filenames.iter()));
                }
                self.status = format!("Deleted {}.", response.deleted);
            }
        }

        Ok(response)
    }

    /// Replace the local index with `GET /documents`.
    pub async fn refresh_documents(&mut self) -> Result<(), ChatError> {
        let listing = self.client.documents().await?;
        self.documents.replace(&listing.items);
        Ok(())
    }

    fn begin(&mut self, query: &str) -> Result<String, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        tracing::info!(
            session_id = ?self.session_id,
            query_preview = ?content_preview(query, self.content_preview),
            "submitting query"
        );
        self.push(Role::User, query);
        self.status = "Querying...".to_string();
        Ok(query.to_string())
    }

    fn finish(&mut self, completion: &Completion) {
        if let Some(id) = &completion.identity.session_id {
            self.session_id = Some(id.clone());
        }
        self.last_timings = Some(completion.timings.clone());
        self.last_documents = completion.documents.clone();

        match &completion.outcome {
            Outcome::Succeeded => {
                let answer = if completion.answer.is_empty() {
                    NO_ANSWER
                } else {
                    completion.answer.as_str()
                };
                tracing::info!(
                    request_id = %completion.sample.request_id,
                    tokens = completion.token_count,
                    answer_preview = ?content_preview(answer, self.content_preview),
                    "query completed"
                );
                self.push(Role::Assistant, answer);
                self.status = "Ready".to_string();
            }
            Outcome::Failed { message } => {
                tracing::warn!(
                    request_id = %completion.sample.request_id,
                    error = %message,
                    "backend reported stream error"
                );
                self.status = format!("Query failed: {}", message);
            }
        }
    }

    fn fail(&mut self, error: ChatError) -> ChatError {
        tracing::warn!(error = %error, "query failed");
        self.status = format!("Query failed: {}", error);
        error
    }

    fn push(&mut self, role: Role, content: &str) {
        self.messages.push(ChatMessage {
            role,
            content: content.to_string(),
        });
    }
}
