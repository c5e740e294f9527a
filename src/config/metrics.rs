//! Rolling metrics configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Number of recent requests kept for percentile statistics
    pub window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window: crate::metrics::DEFAULT_WINDOW,
        }
    }
}
