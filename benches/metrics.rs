//! Benchmarks for the rolling metrics window.
//!
//! Recording happens once per answer and summaries on every render, so both
//! should stay well under a millisecond at the default window.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ragchat::metrics::{nearest_rank, MetricsSample, RollingMetrics};

fn sample(i: u64) -> MetricsSample {
    MetricsSample::success(format!("req-{}", i))
        .with_ttft_ms(Some((i % 97) as f64))
        .with_total_ms(Some((i % 503) as f64 + 20.0))
        .with_tokens_per_sec(Some(30.0 + (i % 11) as f64))
}

fn full_window() -> RollingMetrics {
    let metrics = RollingMetrics::new();
    for i in 0..metrics.capacity() as u64 {
        metrics.record(sample(i));
    }
    metrics
}

fn bench_record(c: &mut Criterion) {
    let metrics = full_window();
    let mut i = 0u64;
    c.bench_function("metrics_record_evicting", |b| {
        b.iter(|| {
            i += 1;
            metrics.record(black_box(sample(i)));
        });
    });
}

fn bench_summary(c: &mut Criterion) {
    let metrics = full_window();
    c.bench_function("metrics_summary_full_window", |b| {
        b.iter(|| black_box(metrics.summary()));
    });
}

fn bench_nearest_rank(c: &mut Criterion) {
    let values: Vec<f64> = (0..50).rev().map(|v| v as f64 * 1.5).collect();
    c.bench_function("nearest_rank_p95", |b| {
        b.iter(|| black_box(nearest_rank(black_box(&values), 0.95)));
    });
}

criterion_group!(benches, bench_record, bench_summary, bench_nearest_rank);
criterion_main!(benches);
