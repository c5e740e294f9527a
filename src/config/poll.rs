//! Stats polling configuration

use serde::{Deserialize, Serialize};

/// Periodic refresh of `/stats` and `/documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between poll ticks
    pub interval_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 5,
        }
    }
}
