//! ClickHouse table schemas.
//!
//! - `visits` rows are inserted once and patched once at exit through a
//!   mutation, so the exit columns are Nullable
//! - LowCardinality for enum-like fields
//! - DateTime64(3, 'UTC') for millisecond precision; Rust rows carry epoch
//!   milliseconds

/// Visits, one row per page-view.
const CREATE_VISITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {db}.visits (
    id String,
    session_id String,
    page_path String,
    referrer Nullable(String),

    -- Attribution
    utm_source Nullable(String),
    utm_medium Nullable(String),
    utm_campaign Nullable(String),
    utm_term Nullable(String),
    utm_content Nullable(String),

    -- Device profile
    device_type LowCardinality(String),
    browser LowCardinality(String),
    os LowCardinality(String),
    os_version String,
    screen_width UInt32,
    screen_height UInt32,

    -- Filled by enrichment, never by the tracker
    country Nullable(String),

    entered_at DateTime64(3, 'UTC'),

    -- Exit, written at most once
    exited_at Nullable(DateTime64(3, 'UTC')),
    time_on_page_seconds Nullable(Int64),
    is_bounce Nullable(Bool)
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(entered_at)
ORDER BY (entered_at, id)
SETTINGS index_granularity = 8192
"#;

/// Click and scroll events.
const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {db}.events (
    id String,
    visit_id String,
    session_id String,
    event_type LowCardinality(String),
    page_path String,

    -- Click
    element_id Nullable(String),
    element_class Nullable(String),
    element_text Nullable(String),
    x_position Nullable(Float64),
    y_position Nullable(Float64),

    -- Scroll
    scroll_depth_percent Nullable(UInt8),

    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (created_at, visit_id, id)
SETTINGS index_granularity = 8192
"#;

/// DDL in execution order for `database`.
pub fn all_tables(database: &str) -> Vec<String> {
    vec![
        format!("CREATE DATABASE IF NOT EXISTS {}", database),
        CREATE_VISITS_TABLE.replace("{db}", database),
        CREATE_EVENTS_TABLE.replace("{db}", database),
    ]
}

/// Table names.
pub mod tables {
    pub const VISITS: &str = "visits";
    pub const EVENTS: &str = "events";
}
