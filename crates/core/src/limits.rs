//! Thresholds and size limits shared by the tracker and the query layer.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Visit Limits ===

/// Visits shorter than this many seconds count as bounces.
///
/// Exactly this many seconds is not a bounce.
pub const BOUNCE_THRESHOLD_SECS: i64 = 10;

/// Maximum page path length in characters.
pub const MAX_PATH_LENGTH: usize = 2000;

/// Maximum referrer length in characters.
pub const MAX_REFERRER_LENGTH: usize = 2048;

/// Maximum UTM attribution value length in characters.
pub const MAX_UTM_LENGTH: usize = 256;

// === Event Limits ===

/// Element text captured on clicks is cut to this many characters.
pub const MAX_ELEMENT_TEXT_CHARS: usize = 100;

/// Maximum element id/class length in characters.
pub const MAX_ELEMENT_ATTR_LENGTH: usize = 256;

// === Timeouts ===

/// Default timeout for the visit creation write.
pub const DEFAULT_CREATION_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for dashboard row selects.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

// === Query Limits ===

/// Default number of rows in the top pages table.
pub const DEFAULT_TOP_PAGES_LIMIT: usize = 10;

/// Upper bound for a requested top pages limit.
pub const MAX_TOP_PAGES_LIMIT: usize = 100;

/// Maximum span of an hour-granularity query (prevents huge series).
pub const MAX_HOURLY_RANGE_DAYS: i64 = 31;

/// Maximum span of a day, week or month series.
pub const MAX_SERIES_RANGE_DAYS: i64 = 3_660;

/// Earliest year a query range may start in.
pub const MIN_RANGE_YEAR: i32 = 1970;

/// Latest year a query range may end in.
pub const MAX_RANGE_YEAR: i32 = 9999;

/// Truncate a string to at most `max` characters, on a char boundary.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
