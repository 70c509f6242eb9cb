//! Dashboard aggregations.
//!
//! Pure reductions over visit and event rows ([`summary`], [`series`],
//! [`breakdown`]) plus the async [`AnalyticsQuery`] that fetches rows from a
//! [`analytics_core::RowSource`] and applies them.

pub mod breakdown;
pub mod query;
pub mod series;
pub mod summary;

pub use breakdown::{
    BreakdownEntry, BrowserStat, CountryStat, DeviceStat, Dimension, OsStat, PageViewCount,
};
pub use query::{AnalyticsQuery, AnalyticsReport, ReportRequest};
pub use series::TimeSeriesPoint;
pub use summary::{AnalyticsSummary, EventStats};
