//! Output formatting helpers for CLI commands

use crate::api::types::{
    DeleteResponse, DocumentItem, IngestResponse, RetrievedDocument, StatsResponse, Timings,
};
use crate::metrics::MetricsSummary;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;

const PREVIEW_CHARS: usize = 80;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Milliseconds with two decimals, `-` when unknown.
pub fn format_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{:.2}ms", ms),
        None => "-".to_string(),
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

/// Pretty JSON for any serializable view.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Format the `/documents` listing as a table
pub fn format_documents_table(items: &[DocumentItem]) -> String {
    let mut table = table(vec!["Key", "Chunks"]);
    for item in items {
        table.add_row(vec![Cell::new(&item.key), Cell::new(item.count)]);
    }
    let total: u64 = items.iter().map(|i| i.count).sum();
    format!("{}\n{} documents, {} chunks", table, items.len(), total)
}

/// Format `/stats` as a table of per-stage timings
pub fn format_stats_table(stats: &StatsResponse) -> String {
    let mut table = table(vec!["Stage", "Avg", "P95", "Count"]);
    for (name, stat) in &stats.timings {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format_ms(Some(stat.avg_ms))),
            Cell::new(format_ms(Some(stat.p95_ms))),
            Cell::new(stat.count),
        ]);
    }

    let provider = stats.provider.as_deref().unwrap_or("unknown");
    let sessions = stats
        .sessions
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Provider: {}  Sessions: {}\n{}",
        provider.cyan(),
        sessions,
        table
    )
}

/// Format the client-side rolling window
pub fn format_metrics_summary(summary: &MetricsSummary) -> String {
    let mut table = table(vec!["Metric", "P50", "P95"]);
    table.add_row(vec![
        Cell::new("TTFT"),
        Cell::new(format_ms(summary.ttft_p50)),
        Cell::new(format_ms(summary.ttft_p95)),
    ]);
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(format_ms(summary.total_p50)),
        Cell::new(format_ms(summary.total_p95)),
    ]);

    let throughput = summary
        .avg_tokens_per_sec
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string());
    let errors = if summary.errors > 0 {
        summary.errors.to_string().red().to_string()
    } else {
        summary.errors.to_string()
    };
    format!(
        "{}\nTokens/sec: {}  Successes: {}  Errors: {}",
        table,
        throughput,
        summary.successes.to_string().green(),
        errors
    )
}

/// Format retrieved documents with score and a content preview
pub fn format_retrieved_documents(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return "No documents returned yet.".to_string();
    }

    let mut table = table(vec!["#", "Source", "Score", "Content"]);
    for (i, doc) in documents.iter().enumerate() {
        let score = doc
            .score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(doc.source()),
            Cell::new(score),
            Cell::new(preview(doc.content.as_deref().unwrap_or(""))),
        ]);
    }
    table.to_string()
}

/// One-line latency breakdown
pub fn format_timings(timings: &Timings) -> String {
    format!(
        "Latency: {} (retrieval {}, generation {}, ttft {})",
        format_ms(timings.total_ms),
        format_ms(timings.retrieval_ms),
        format_ms(timings.generation_ms),
        format_ms(timings.ttft_ms),
    )
}

pub fn format_ingest(response: &IngestResponse) -> String {
    let mut out = format!("✓ Ingested {} documents", response.ingested);
    for error in &response.errors {
        let text = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        out.push_str(&format!("\n  {} {}", "✗".red(), text));
    }
    out
}

pub fn format_delete(response: &DeleteResponse) -> String {
    match &response.error {
        Some(error) => format!("{} Delete failed: {}", "✗".red(), error),
        None => format!("✓ Deleted {}", response.deleted),
    }
}

/// Status line, colored by outcome.
pub fn format_status(status: &str) -> String {
    if status.contains("failed") {
        status.red().to_string()
    } else if status == "Ready" {
        status.green().to_string()
    } else {
        status.yellow().to_string()
    }
}
