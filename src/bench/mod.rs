//! Streaming load benchmark.
//!
//! Drives `/query/stream` from a fixed pool of workers that pull request ids
//! from a shared counter until the phase's budget is spent. An optional
//! warmup phase runs first and is reported separately; primary metrics come
//! from the measured phase only.
//!
//! Each request goes through the same decoder and state machine as the chat
//! client, so TTFT and token counts mean the same thing in both places.

pub mod error;
pub mod stats;

pub use error::BenchError;
pub use stats::{Phase, PhaseStats};

use crate::api::types::QueryRequest;
use crate::client::RagClient;
use crate::session::{drive, Completion, RequestState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_PROMPT: &str = "Explain what this system is and why vLLM matters.";

/// Knobs for one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchSettings {
    pub concurrency: usize,
    pub requests: usize,
    pub warmup_requests: usize,
    /// Deadline for a whole request, body included
    pub timeout: Duration,
    pub max_output_tokens: Option<u32>,
    pub prompt: String,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            requests: 100,
            warmup_requests: 0,
            timeout: Duration::from_secs(120),
            max_output_tokens: None,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl BenchSettings {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.concurrency == 0 {
            return Err(BenchError::InvalidSettings(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.requests == 0 {
            return Err(BenchError::InvalidSettings(
                "requests must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(BenchError::InvalidSettings(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(BenchError::InvalidSettings("prompt is empty".to_string()));
        }
        Ok(())
    }

    /// Replace the prompt with the trimmed contents of `path`.
    pub async fn with_prompt_file(mut self, path: &Path) -> Result<Self, BenchError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BenchError::PromptFile {
                path: path.to_path_buf(),
                source,
            })?;
        self.prompt = text.trim().to_string();
        Ok(self)
    }
}

/// Outcome of one benchmark request. Latencies in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchRecord {
    pub id: usize,
    pub success: bool,
    pub ttft_ms: Option<f64>,
    pub total_ms: Option<f64>,
    /// Time per output token after the first
    pub tpot_ms: Option<f64>,
    pub token_count: Option<u64>,
    pub prompt_tokens: Option<u64>,
    pub tokens_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl BenchRecord {
    pub fn failed(id: usize, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            ttft_ms: None,
            total_ms: None,
            tpot_ms: None,
            token_count: None,
            prompt_tokens: None,
            tokens_per_sec: None,
            error: Some(error.into()),
        }
    }

    /// Client-side measurements for a finished stream.
    ///
    /// The token count prefers the server's `token_count`; TTFT falls back to
    /// total latency when no token arrived.
    pub fn from_completion(id: usize, completion: &Completion) -> Self {
        if let crate::session::Outcome::Failed { message } = &completion.outcome {
            return Self::failed(id, message.clone());
        }

        let total = completion.elapsed;
        let tokens = completion
            .server_token_count
            .unwrap_or(completion.token_count);

        let tpot_ms = match completion.generation_span {
            Some(span) if tokens > 1 => Some(millis(span) / (tokens - 1) as f64),
            _ => None,
        };
        let tokens_per_sec = if total.is_zero() {
            0.0
        } else {
            tokens as f64 / total.as_secs_f64()
        };

        Self {
            id,
            success: true,
            ttft_ms: Some(millis(completion.client_ttft.unwrap_or(total))),
            total_ms: Some(millis(total)),
            tpot_ms,
            token_count: Some(tokens),
            prompt_tokens: completion.prompt_tokens,
            tokens_per_sec: Some(tokens_per_sec),
            error: None,
        }
    }
}

/// Environment the run happened in, collected best-effort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub provider: Option<String>,
    pub region: Option<String>,
    pub cluster_label: Option<String>,
    pub node_instance_type: Option<String>,
    pub gpu_model: Option<String>,
    pub gpu_count: Option<u32>,
    pub model_id: Option<String>,
    pub dtype: Option<String>,
    pub quantization: Option<String>,
    pub max_model_len: Option<u32>,
    pub backend_image_tag: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RunMetadata {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(*key).filter(|value| !value.is_empty()))
        };
        let positive = |keys: &[&str]| {
            first(keys)
                .and_then(|value| value.parse::<u32>().ok())
                .filter(|&n| n > 0)
        };

        Self {
            provider: first(&["RAG_PROVIDER", "PROVIDER"]),
            region: first(&["RAG_REGION", "REGION"]),
            cluster_label: first(&["CLUSTER_LABEL", "CLUSTER_NAME"]),
            node_instance_type: first(&["NODE_INSTANCE_TYPE"]),
            gpu_model: first(&["GPU_MODEL"]),
            gpu_count: positive(&["GPU_COUNT"]),
            model_id: first(&["VLLM_MODEL", "MODEL_ID"]),
            dtype: first(&["VLLM_DTYPE"]),
            quantization: first(&["VLLM_QUANTIZATION"]),
            max_model_len: positive(&["VLLM_MAX_MODEL_LEN"]),
            backend_image_tag: first(&["BACKEND_IMAGE_TAG"]),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Phases {
    pub warmup: Option<PhaseStats>,
    pub measured: PhaseStats,
}

/// JSON summary of a run. Top-level statistics are the measured phase's.
#[derive(Debug, Clone, Serialize)]
pub struct BenchSummary {
    #[serde(flatten)]
    pub primary: PhaseStats,
    pub concurrency: usize,
    pub phases: Phases,
    pub duration_seconds: f64,
    pub warmup_requests: usize,
    pub measured_requests: usize,
    pub max_output_tokens: Option<u32>,
    pub run_metadata: RunMetadata,
}

/// Summary plus the raw measured records.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub summary: BenchSummary,
    pub records: Vec<BenchRecord>,
}

impl BenchReport {
    /// Up to `limit` error messages from the measured phase.
    pub fn errors(&self, limit: usize) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter_map(|r| r.error.as_deref())
            .take(limit)
    }

    /// Write the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(&self.summary)?;
        std::fs::write(path, json).map_err(|source| BenchError::Output {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Run one streaming request to completion, bounded by `timeout`.
pub async fn run_request(
    client: &RagClient,
    request: &QueryRequest,
    id: usize,
    timeout: Duration,
) -> BenchRecord {
    let started_at = Instant::now();
    let attempt = async {
        let frames = client
            .query_stream(request)
            .await
            .map_err(|e| e.to_string())?;
        drive(frames, RequestState::new(started_at), Instant::now, |_| {})
            .await
            .map_err(|e| e.to_string())
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(completion)) => BenchRecord::from_completion(id, &completion),
        Ok(Err(message)) => BenchRecord::failed(id, message),
        Err(_) => BenchRecord::failed(
            id,
            format!("Request timeout after {}ms", timeout.as_millis()),
        ),
    }
}

/// Run `total` requests over at most `concurrency` workers.
///
/// Records come back ordered by request id.
pub async fn run_phase(
    client: &RagClient,
    request: &QueryRequest,
    concurrency: usize,
    total: usize,
    timeout: Duration,
) -> Vec<BenchRecord> {
    let next_id = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..concurrency.min(total))
        .map(|worker| {
            let client = client.clone();
            let request = request.clone();
            let next_id = Arc::clone(&next_id);
            tokio::spawn(async move {
                let mut records = Vec::new();
                loop {
                    let id = next_id.fetch_add(1, Ordering::Relaxed);
                    if id >= total {
                        break;
                    }
                    let record = run_request(&client, &request, id, timeout).await;
                    tracing::debug!(
                        worker,
                        id,
                        success = record.success,
                        "benchmark request finished"
                    );
                    records.push(record);
                }
                records
            })
        })
        .collect();

    let mut records = Vec::with_capacity(total);
    for result in futures::future::join_all(handles).await {
        match result {
            Ok(batch) => records.extend(batch),
            Err(e) => tracing::error!(error = %e, "benchmark worker failed"),
        }
    }
    records.sort_by_key(|r| r.id);
    records
}

/// Warmup (if configured) then the measured phase.
pub async fn run_benchmark(
    client: &RagClient,
    settings: &BenchSettings,
) -> Result<BenchReport, BenchError> {
    settings.validate()?;

    let request = QueryRequest::new(settings.prompt.clone())
        .with_max_tokens(settings.max_output_tokens);
    let started = Instant::now();

    let warmup = if settings.warmup_requests > 0 {
        tracing::info!(requests = settings.warmup_requests, "running warmup phase");
        let records = run_phase(
            client,
            &request,
            settings.concurrency,
            settings.warmup_requests,
            settings.timeout,
        )
        .await;
        Some(PhaseStats::compute(Phase::Warmup, &records))
    } else {
        None
    };

    tracing::info!(requests = settings.requests, "running measured phase");
    let records = run_phase(
        client,
        &request,
        settings.concurrency,
        settings.requests,
        settings.timeout,
    )
    .await;
    let measured = PhaseStats::compute(Phase::Measured, &records);
    let duration = started.elapsed().as_secs_f64();

    let summary = BenchSummary {
        primary: measured.clone(),
        concurrency: settings.concurrency,
        phases: Phases { warmup, measured },
        duration_seconds: (duration * 1000.0).round() / 1000.0,
        warmup_requests: settings.warmup_requests,
        measured_requests: settings.requests,
        max_output_tokens: settings.max_output_tokens,
        run_metadata: RunMetadata::from_env(),
    };

    Ok(BenchReport { summary, records })
}
