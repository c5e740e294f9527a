//! Per-phase aggregation of benchmark records.

use super::BenchRecord;
use crate::metrics::{mean, nearest_rank};
use serde::Serialize;

/// Which part of a run a set of records belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Warmup,
    Measured,
}

/// Aggregate statistics over one phase. Latencies in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStats {
    pub phase: Phase,
    pub requests: usize,
    pub success: usize,
    pub errors: usize,
    pub ttft_p50_ms: Option<f64>,
    pub ttft_p95_ms: Option<f64>,
    pub latency_p50_ms: Option<f64>,
    pub latency_p95_ms: Option<f64>,
    pub tpot_p50_ms: Option<f64>,
    pub tpot_p95_ms: Option<f64>,
    pub avg_tokens_per_sec: f64,
    pub total_tokens: u64,
    pub avg_output_tokens: f64,
    pub total_prompt_tokens: Option<u64>,
    pub avg_prompt_tokens: Option<f64>,
}

fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn percentile_ms(values: &[f64], pct: f64) -> Option<f64> {
    nearest_rank(values, pct).map(|v| round(v, 2))
}

impl PhaseStats {
    /// Aggregate `records`. Only successful records contribute to latency
    /// and token statistics.
    pub fn compute(phase: Phase, records: &[BenchRecord]) -> Self {
        let success: Vec<&BenchRecord> = records.iter().filter(|r| r.success).collect();

        let ttft: Vec<f64> = success.iter().filter_map(|r| r.ttft_ms).collect();
        let total: Vec<f64> = success.iter().filter_map(|r| r.total_ms).collect();
        let tpot: Vec<f64> = success.iter().filter_map(|r| r.tpot_ms).collect();
        let throughput: Vec<f64> = success.iter().filter_map(|r| r.tokens_per_sec).collect();
        let token_counts: Vec<u64> = success
            .iter()
            .filter_map(|r| r.token_count)
            .filter(|&n| n > 0)
            .collect();
        let prompt_tokens: Vec<u64> = success.iter().filter_map(|r| r.prompt_tokens).collect();

        let as_f64 = |values: &[u64]| values.iter().map(|&n| n as f64).collect::<Vec<_>>();

        Self {
            phase,
            requests: records.len(),
            success: success.len(),
            errors: records.len() - success.len(),
            ttft_p50_ms: percentile_ms(&ttft, 0.50),
            ttft_p95_ms: percentile_ms(&ttft, 0.95),
            latency_p50_ms: percentile_ms(&total, 0.50),
            latency_p95_ms: percentile_ms(&total, 0.95),
            tpot_p50_ms: percentile_ms(&tpot, 0.50),
            tpot_p95_ms: percentile_ms(&tpot, 0.95),
            avg_tokens_per_sec: round(mean(&throughput).unwrap_or(0.0), 2),
            total_tokens: token_counts.iter().sum(),
            avg_output_tokens: round(mean(&as_f64(&token_counts)).unwrap_or(0.0), 1),
            total_prompt_tokens: (!prompt_tokens.is_empty()).then(|| prompt_tokens.iter().sum()),
            avg_prompt_tokens: mean(&as_f64(&prompt_tokens)).map(|v| round(v, 1)),
        }
    }
}
