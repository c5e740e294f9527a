//! Stats and watch command handlers

use crate::cli::output::{format_documents_table, format_json, format_stats_table};
use crate::cli::{Context, StatsArgs, WatchArgs};
use crate::client::RagClient;
use crate::poller::{PollSnapshot, StatsPoller};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Handle `ragchat stats`
pub async fn handle_stats(
    args: &StatsArgs,
    client: &RagClient,
) -> Result<String, Box<dyn std::error::Error>> {
    let stats = client.stats().await?;
    if args.json {
        Ok(format_json(&stats)?)
    } else {
        Ok(format_stats_table(&stats))
    }
}

/// Render one poll result. Failed fetches show their error in place.
pub fn render_snapshot(snapshot: &PollSnapshot) -> String {
    let stats = match &snapshot.stats {
        Ok(stats) => format_stats_table(stats),
        Err(e) => format!("{} {}", "stats unavailable:".red(), e),
    };
    let documents = match &snapshot.documents {
        Ok(listing) => format_documents_table(&listing.items),
        Err(e) => format!("{} {}", "documents unavailable:".red(), e),
    };
    format!(
        "── #{} at {} ──\n{}\n{}",
        snapshot.sequence,
        snapshot.polled_at.format("%H:%M:%S"),
        stats,
        documents
    )
}

/// Handle `ragchat watch`: print every newer snapshot until Ctrl-C.
pub async fn run_watch(args: &WatchArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let seconds = args.interval.unwrap_or(ctx.config.poll.interval_seconds);
    if seconds == 0 {
        return Err("interval must be non-zero".into());
    }

    let poller = StatsPoller::new(Arc::new(ctx.client), Duration::from_secs(seconds));
    let mut rx = poller.subscribe();
    let cancel_token = CancellationToken::new();
    let handle = poller.start(cancel_token.clone());

    println!("Watching every {}s, Ctrl-C to stop", seconds);
    let mut last_sequence = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = rx.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    // Overlapping fetches can land out of order.
                    if snapshot.sequence > last_sequence {
                        last_sequence = snapshot.sequence;
                        println!("{}", render_snapshot(&snapshot));
                    }
                }
            }
        }
    }

    cancel_token.cancel();
    handle.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DocumentItem, DocumentsResponse, StatsResponse};
    use chrono::Utc;

    #[test]
    fn test_render_snapshot_with_partial_failure() {
        let snapshot = PollSnapshot {
            sequence: 4,
            polled_at: Utc::now(),
            stats: Err("Network error: connection refused".to_string()),
            documents: Ok(DocumentsResponse {
                items: vec![DocumentItem {
                    key: "guide.pdf".to_string(),
                    count: 3,
                }],
            }),
        };
        let output = render_snapshot(&snapshot);
        assert!(output.contains("#4"));
        assert!(output.contains("connection refused"));
        assert!(output.contains("guide.pdf"));
    }

    #[test]
    fn test_render_snapshot_ok() {
        let snapshot = PollSnapshot {
            sequence: 1,
            polled_at: Utc::now(),
            stats: Ok(StatsResponse::default()),
            documents: Ok(DocumentsResponse::default()),
        };
        let output = render_snapshot(&snapshot);
        assert!(output.contains("Stage"));
        assert!(output.contains("0 documents, 0 chunks"));
    }
}
