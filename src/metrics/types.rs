//! # Metrics Types
//!
//! Samples recorded per completed request and the summary computed over them.

use serde::{Deserialize, Serialize};

/// Outcome of one completed streaming request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Server request id, or a client-generated one when the server sent none
    pub request_id: String,
    /// Time to first token in milliseconds
    pub ttft_ms: Option<f64>,
    /// End-to-end latency in milliseconds
    pub total_ms: Option<f64>,
    /// Generation throughput
    pub tokens_per_sec: Option<f64>,
    /// False when the request ended with an error
    pub success: bool,
}

impl MetricsSample {
    pub fn success(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ttft_ms: None,
            total_ms: None,
            tokens_per_sec: None,
            success: true,
        }
    }

    pub fn failure(request_id: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(request_id)
        }
    }

    pub fn with_ttft_ms(mut self, ttft_ms: Option<f64>) -> Self {
        self.ttft_ms = ttft_ms;
        self
    }

    pub fn with_total_ms(mut self, total_ms: Option<f64>) -> Self {
        self.total_ms = total_ms;
        self
    }

    pub fn with_tokens_per_sec(mut self, tokens_per_sec: Option<f64>) -> Self {
        self.tokens_per_sec = tokens_per_sec;
        self
    }
}

/// Statistics over the current rolling window.
///
/// Percentiles are nearest-rank; every statistic is `None` when no sample in
/// the window carries the underlying value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub ttft_p50: Option<f64>,
    pub ttft_p95: Option<f64>,
    pub total_p50: Option<f64>,
    pub total_p95: Option<f64>,
    pub avg_tokens_per_sec: Option<f64>,
    pub successes: usize,
    pub errors: usize,
}

impl MetricsSummary {
    /// Number of samples the summary was computed over.
    pub fn count(&self) -> usize {
        self.successes + self.errors
    }
}
