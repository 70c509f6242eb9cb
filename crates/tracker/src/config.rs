//! Tracker configuration.

use analytics_core::limits::{BOUNCE_THRESHOLD_SECS, DEFAULT_CREATION_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Visit recorder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Creation writes slower than this fail the visit
    #[serde(default = "default_creation_timeout_ms")]
    pub creation_timeout_ms: u64,
    /// Close the visit when the page is backgrounded, not only on unload
    #[serde(default)]
    pub exit_on_hidden: bool,
    /// Visits strictly shorter than this count as bounces
    #[serde(default = "default_bounce_threshold_secs")]
    pub bounce_threshold_secs: i64,
}

fn default_creation_timeout_ms() -> u64 {
    DEFAULT_CREATION_TIMEOUT_MS
}

fn default_bounce_threshold_secs() -> i64 {
    BOUNCE_THRESHOLD_SECS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            creation_timeout_ms: default_creation_timeout_ms(),
            exit_on_hidden: false,
            bounce_threshold_secs: default_bounce_threshold_secs(),
        }
    }
}

impl TrackerConfig {
    pub fn creation_timeout(&self) -> Duration {
        Duration::from_millis(self.creation_timeout_ms)
    }

    pub fn with_exit_on_hidden(mut self, exit_on_hidden: bool) -> Self {
        self.exit_on_hidden = exit_on_hidden;
        self
    }

    pub fn with_creation_timeout(mut self, timeout: Duration) -> Self {
        self.creation_timeout_ms = timeout.as_millis() as u64;
        self
    }
}
