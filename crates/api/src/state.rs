//! Application state shared across handlers.

use aggregation::{AnalyticsQuery, AnalyticsReport, ReportRequest};
use analytics_core::{Result, RowSource};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::debug;

/// Default TTL for cached reports (30 seconds).
pub const REPORT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum cached reports.
const REPORT_CACHE_MAX_CAPACITY: u64 = 1_000;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Aggregations over the configured row source
    pub query: AnalyticsQuery,
    /// Full reports keyed by request parameters
    reports: Cache<ReportRequest, AnalyticsReport>,
}

impl AppState {
    pub fn new(source: Arc<dyn RowSource>) -> Self {
        Self::with_query(AnalyticsQuery::new(source), REPORT_CACHE_TTL)
    }

    pub fn with_query(query: AnalyticsQuery, cache_ttl: Duration) -> Self {
        Self {
            query,
            reports: Cache::builder()
                .max_capacity(REPORT_CACHE_MAX_CAPACITY)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    /// Build a report, serving repeated requests from the cache.
    ///
    /// Failed queries are not cached.
    pub async fn report(&self, request: ReportRequest) -> Result<AnalyticsReport> {
        if let Some(cached) = self.reports.get(&request).await {
            metrics().report_cache_hits.inc();
            debug!(range = %request.range, "Report cache hit");
            return Ok(cached);
        }

        let report = self.query.report(&request).await?;
        self.reports.insert(request, report.clone()).await;
        Ok(report)
    }
}
