//! Background refresh of backend stats and the document listing.
//!
//! [`StatsPoller`] is an explicit task: [`StatsPoller::start`] spawns it and
//! returns its handle, cancelling the token passed in stops it. Each tick
//! spawns an independent fetch; slow fetches are neither coalesced nor
//! cancelled by later ticks, so results may arrive out of order. Snapshots
//! carry a sequence number and a receiver can ignore stale ones.

use crate::api::types::{DocumentsResponse, StatsResponse};
use crate::client::ClientError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Source of the data refreshed on every tick.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch_stats(&self) -> Result<StatsResponse, ClientError>;
    async fn fetch_documents(&self) -> Result<DocumentsResponse, ClientError>;
}

/// Result of one poll tick. Failures are kept as display strings.
#[derive(Debug, Clone)]
pub struct PollSnapshot {
    /// Tick number, starting at 1
    pub sequence: u64,
    /// When the fetch completed
    pub polled_at: DateTime<Utc>,
    pub stats: Result<StatsResponse, String>,
    pub documents: Result<DocumentsResponse, String>,
}

/// Periodic poller publishing [`PollSnapshot`]s on a watch channel.
pub struct StatsPoller {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    sender: watch::Sender<Option<PollSnapshot>>,
}

impl StatsPoller {
    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            source,
            interval,
            sender,
        }
    }

    /// Receiver for published snapshots; `None` until the first fetch lands.
    pub fn subscribe(&self) -> watch::Receiver<Option<PollSnapshot>> {
        self.sender.subscribe()
    }

    /// Start polling. The first tick fires immediately.
    ///
    /// The returned handle completes after cancellation, once every
    /// in-flight fetch has been dropped.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let tracker = TaskTracker::new();
            let mut sequence = 0u64;

            tracing::info!(
                interval_ms = self.interval.as_millis() as u64,
                "Stats poller started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Stats poller shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        sequence += 1;
                        tracker.spawn(poll_once(
                            Arc::clone(&self.source),
                            self.sender.clone(),
                            sequence,
                            cancel_token.clone(),
                        ));
                    }
                }
            }

            tracker.close();
            tracker.wait().await;
        })
    }
}

async fn poll_once(
    source: Arc<dyn SnapshotSource>,
    sender: watch::Sender<Option<PollSnapshot>>,
    sequence: u64,
    cancel_token: CancellationToken,
) {
    let fetch = async {
        tokio::join!(source.fetch_stats(), source.fetch_documents())
    };

    let (stats, documents) = tokio::select! {
        _ = cancel_token.cancelled() => return,
        results = fetch => results,
    };

    if let Err(ref e) = stats {
        tracing::warn!(sequence, error = %e, "stats poll failed");
    }
    if let Err(ref e) = documents {
        tracing::warn!(sequence, error = %e, "documents poll failed");
    }

    let snapshot = PollSnapshot {
        sequence,
        polled_at: Utc::now(),
        stats: stats.map_err(|e| e.to_string()),
        documents: documents.map_err(|e| e.to_string()),
    };
    tracing::debug!(sequence, "poll snapshot published");
    sender.send_replace(Some(snapshot));
}
