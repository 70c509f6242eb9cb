//! REST backend configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Managed persistence backend (PostgREST-compatible row API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Row API root, e.g. `https://project.example.co/rest/v1`
    pub base_url: String,
    /// Key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_visits_table")]
    pub visits_table: String,
    #[serde(default = "default_events_table")]
    pub events_table: String,
    /// Timeout for awaited requests in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Timeout for the unload beacon in milliseconds
    #[serde(default = "default_beacon_timeout_ms")]
    pub beacon_timeout_ms: u64,
    /// Rows requested per page of a select
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Selects matching more rows than this fail instead of truncating
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_visits_table() -> String {
    "visits".to_string()
}

fn default_events_table() -> String {
    "events".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_beacon_timeout_ms() -> u64 {
    2_000
}

fn default_page_size() -> usize {
    1_000
}

fn default_max_rows() -> usize {
    50_000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_key: String::new(),
            visits_table: default_visits_table(),
            events_table: default_events_table(),
            request_timeout_ms: default_request_timeout_ms(),
            beacon_timeout_ms: default_beacon_timeout_ms(),
            page_size: default_page_size(),
            max_rows: default_max_rows(),
        }
    }
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// URL of a table endpoint.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), table)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn beacon_timeout(&self) -> Duration {
        Duration::from_millis(self.beacon_timeout_ms)
    }
}
