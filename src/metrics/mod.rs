//! # Rolling Metrics
//!
//! Client-side latency statistics over the most recent completed requests.
//!
//! [`RollingMetrics`] keeps a fixed-capacity FIFO window of
//! [`MetricsSample`]s (50 by default). [`RollingMetrics::summary`] recomputes
//! TTFT and total-latency p50/p95, mean tokens/sec and success/error counts
//! from whatever the window currently holds.
//!
//! The window uses interior mutability so a single instance can be shared as
//! `Arc<RollingMetrics>` by concurrent requests; outcomes land in completion
//! order.

pub mod percentile;
pub mod types;

pub use percentile::{mean, nearest_rank};
pub use types::{MetricsSample, MetricsSummary};

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

/// Default number of samples kept in the window.
pub const DEFAULT_WINDOW: usize = 50;

/// Fixed-capacity window of recent request outcomes.
pub struct RollingMetrics {
    samples: RwLock<VecDeque<MetricsSample>>,
    capacity: usize,
}

impl RollingMetrics {
    /// Creates a window holding at most [`DEFAULT_WINDOW`] samples.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW)
    }

    /// Creates a window with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest when the window is full.
    pub fn record(&self, sample: MetricsSample) {
        tracing::debug!(
            request_id = %sample.request_id,
            success = sample.success,
            ttft_ms = ?sample.ttft_ms,
            total_ms = ?sample.total_ms,
            "recording metrics sample"
        );

        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    /// Computes statistics over the current window.
    pub fn summary(&self) -> MetricsSummary {
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);

        let ttft: Vec<f64> = samples.iter().filter_map(|s| s.ttft_ms).collect();
        let total: Vec<f64> = samples.iter().filter_map(|s| s.total_ms).collect();
        let throughput: Vec<f64> = samples.iter().filter_map(|s| s.tokens_per_sec).collect();
        let successes = samples.iter().filter(|s| s.success).count();

        MetricsSummary {
            ttft_p50: nearest_rank(&ttft, 0.50),
            ttft_p95: nearest_rank(&ttft, 0.95),
            total_p50: nearest_rank(&total, 0.50),
            total_p95: nearest_rank(&total, 0.95),
            avg_tokens_per_sec: mean(&throughput),
            successes,
            errors: samples.len() - successes,
        }
    }

    /// Returns all samples in insertion order (oldest first).
    pub fn samples(&self) -> Vec<MetricsSample> {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Returns the number of samples currently stored.
    pub fn len(&self) -> usize {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no sample has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every sample.
    pub fn clear(&self) {
        self.samples
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for RollingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> MetricsSample {
        MetricsSample::success(format!("req-{}", i)).with_total_ms(Some(i as f64))
    }

    #[test]
    fn test_new_creates_empty_window() {
        let metrics = RollingMetrics::new();
        assert!(metrics.is_empty());
        assert_eq!(metrics.capacity(), 50);
    }

    #[test]
    fn test_empty_summary_is_all_none() {
        let summary = RollingMetrics::new().summary();
        assert_eq!(summary, MetricsSummary::default());
        assert_eq!(summary.ttft_p50, None);
        assert_eq!(summary.total_p95, None);
        assert_eq!(summary.avg_tokens_per_sec, None);
        assert_eq!(summary.successes, 0);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn test_eviction_fifo() {
        let metrics = RollingMetrics::new();
        for i in 0..60 {
            metrics.record(sample(i));
        }

        assert_eq!(metrics.len(), 50);
        let samples = metrics.samples();
        assert_eq!(samples[0].request_id, "req-10");
        assert_eq!(samples[49].request_id, "req-59");
        for pair in samples.windows(2) {
            assert!(pair[0].total_ms < pair[1].total_ms);
        }
    }

    #[test]
    fn test_p95_after_51_samples() {
        let metrics = RollingMetrics::new();
        for i in 1..=51 {
            metrics.record(sample(i));
        }

        let summary = metrics.summary();
        // Window holds 2..=51. ceil(50 * 0.95) = ceil(47.5) = 48, so the index
        // is 47 and the value 49. An index of 46 (value 48) is an arithmetic
        // slip in ceil(47.5), not a different rounding rule; keep 49.
        assert_eq!(summary.total_p95, Some(49.0));
        assert_eq!(summary.total_p50, Some(26.0));
        assert_eq!(summary.successes, 50);
    }

    #[test]
    fn test_summary_skips_missing_values() {
        let metrics = RollingMetrics::new();
        metrics.record(
            MetricsSample::success("a")
                .with_ttft_ms(Some(100.0))
                .with_total_ms(Some(500.0))
                .with_tokens_per_sec(Some(20.0)),
        );
        metrics.record(MetricsSample::failure("b").with_total_ms(Some(50.0)));
        metrics.record(
            MetricsSample::success("c")
                .with_ttft_ms(Some(300.0))
                .with_tokens_per_sec(Some(40.0)),
        );

        let summary = metrics.summary();
        assert_eq!(summary.ttft_p50, Some(100.0));
        assert_eq!(summary.ttft_p95, Some(300.0));
        assert_eq!(summary.total_p50, Some(50.0));
        assert_eq!(summary.total_p95, Some(500.0));
        assert_eq!(summary.avg_tokens_per_sec, Some(30.0));
        assert_eq!(summary.successes, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.count(), 3);
    }

    #[test]
    fn test_custom_capacity() {
        let metrics = RollingMetrics::with_capacity(3);
        for i in 0..5 {
            metrics.record(sample(i));
        }
        let ids: Vec<String> = metrics.samples().into_iter().map(|s| s.request_id).collect();
        assert_eq!(ids, vec!["req-2", "req-3", "req-4"]);

        metrics.clear();
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let metrics = RollingMetrics::with_capacity(0);
        metrics.record(sample(1));
        metrics.record(sample(2));
        assert_eq!(metrics.len(), 1);
    }
}
