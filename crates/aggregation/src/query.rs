//! Async query layer over a [`RowSource`].
//!
//! Every operation fetches rows for the requested range and reduces them in
//! memory. A failing source is reported as an error, never as an empty
//! result, so callers can tell "no data" from "query failed".

use analytics_core::error::{DbErrorCode, ValidationErrorCode};
use analytics_core::limits::{
    DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_TOP_PAGES_LIMIT, MAX_HOURLY_RANGE_DAYS, MAX_SERIES_RANGE_DAYS,
    MAX_TOP_PAGES_LIMIT,
};
use analytics_core::{DateRange, Error, EventRow, Granularity, Result, RowFilter, RowSource, VisitRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, error, instrument};

use crate::breakdown::{
    breakdown, browser_stats, country_stats, device_stats, os_stats, top_pages, BreakdownEntry,
    BrowserStat, CountryStat, DeviceStat, Dimension, OsStat, PageViewCount,
};
use crate::series::{time_series, TimeSeriesPoint};
use crate::summary::{event_stats, summarize, AnalyticsSummary, EventStats};

/// Parameters of a dashboard report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportRequest {
    pub range: DateRange,
    pub granularity: Granularity,
    pub top_pages_limit: usize,
    pub filter: RowFilter,
}

impl ReportRequest {
    pub fn new(range: DateRange, granularity: Granularity) -> Self {
        Self {
            range,
            granularity,
            top_pages_limit: DEFAULT_TOP_PAGES_LIMIT,
            filter: RowFilter::none(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.top_pages_limit = limit;
        self
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Everything a dashboard page renders for one range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
    pub granularity: Granularity,
    pub summary: AnalyticsSummary,
    pub events: EventStats,
    pub time_series: Vec<TimeSeriesPoint>,
    pub devices: Vec<DeviceStat>,
    pub browsers: Vec<BrowserStat>,
    pub operating_systems: Vec<OsStat>,
    pub countries: Vec<CountryStat>,
    pub top_pages: Vec<PageViewCount>,
    pub generated_at: DateTime<Utc>,
}

/// Aggregation queries for dashboard consumers.
#[derive(Clone)]
pub struct AnalyticsQuery {
    source: Arc<dyn RowSource>,
    timeout: Duration,
}

impl AnalyticsQuery {
    pub fn new(source: Arc<dyn RowSource>) -> Self {
        Self {
            source,
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source(&self) -> &Arc<dyn RowSource> {
        &self.source
    }

    #[instrument(skip(self), fields(range = %request.range, granularity = %request.granularity))]
    pub async fn report(&self, request: &ReportRequest) -> Result<AnalyticsReport> {
        check_granularity(&request.range, request.granularity)?;
        let limit = clamp_limit(request.top_pages_limit);

        let (visits, events) = tokio::try_join!(
            self.visits(&request.range, &request.filter),
            self.events(&request.range, &request.filter),
        )?;

        debug!(visits = visits.len(), events = events.len(), "Building report");

        Ok(AnalyticsReport {
            from: request.range.from,
            to: request.range.to,
            granularity: request.granularity,
            summary: summarize(&visits),
            events: event_stats(&events),
            time_series: time_series(&visits, &request.range, request.granularity),
            devices: device_stats(&visits),
            browsers: browser_stats(&visits),
            operating_systems: os_stats(&visits),
            countries: country_stats(&visits),
            top_pages: top_pages(&visits, limit),
            generated_at: Utc::now(),
        })
    }

    pub async fn summary(&self, range: &DateRange, filter: &RowFilter) -> Result<AnalyticsSummary> {
        Ok(summarize(&self.visits(range, filter).await?))
    }

    pub async fn event_stats(&self, range: &DateRange, filter: &RowFilter) -> Result<EventStats> {
        Ok(event_stats(&self.events(range, filter).await?))
    }

    pub async fn time_series(
        &self,
        range: &DateRange,
        granularity: Granularity,
        filter: &RowFilter,
    ) -> Result<Vec<TimeSeriesPoint>> {
        check_granularity(range, granularity)?;
        Ok(time_series(&self.visits(range, filter).await?, range, granularity))
    }

    pub async fn breakdown(
        &self,
        range: &DateRange,
        dimension: Dimension,
        filter: &RowFilter,
    ) -> Result<Vec<BreakdownEntry>> {
        Ok(breakdown(&self.visits(range, filter).await?, dimension))
    }

    pub async fn top_pages(&self, range: &DateRange, limit: usize, filter: &RowFilter) -> Result<Vec<PageViewCount>> {
        Ok(top_pages(&self.visits(range, filter).await?, clamp_limit(limit)))
    }

    async fn visits(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<VisitRow>> {
        let rows = self
            .timed("visits", range, self.source.query_visits(range, filter))
            .await?;
        // Sources may return a superset; the range and filter are authoritative here.
        Ok(rows
            .into_iter()
            .filter(|v| range.contains(v.entered_at) && filter.matches_visit(v))
            .collect())
    }

    async fn events(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<EventRow>> {
        let rows = self
            .timed("events", range, self.source.query_events(range, filter))
            .await?;
        Ok(rows
            .into_iter()
            .filter(|e| range.contains(e.created_at) && filter.matches_event(e))
            .collect())
    }

    async fn timed<T>(
        &self,
        table: &'static str,
        range: &DateRange,
        fut: impl Future<Output = Result<Vec<T>>>,
    ) -> Result<Vec<T>> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::database(
                DbErrorCode::Timeout,
                format!("{} query exceeded {}s", table, self.timeout.as_secs()),
            )),
        };
        metrics()
            .query_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match result {
            Ok(rows) => {
                metrics().queries_served.inc();
                debug!(table, range = %range, rows = rows.len(), "Rows fetched");
                Ok(rows)
            }
            Err(e) => {
                metrics().query_failures.inc();
                error!(
                    table,
                    range = %range,
                    error = %e,
                    code = e.error_code().unwrap_or("UNKNOWN"),
                    "Row select failed"
                );
                Err(e)
            }
        }
    }
}

/// Caps the number of zero-filled buckets a series can allocate.
fn check_granularity(range: &DateRange, granularity: Granularity) -> Result<()> {
    let max_days = match granularity {
        Granularity::Hour => MAX_HOURLY_RANGE_DAYS,
        _ => MAX_SERIES_RANGE_DAYS,
    };
    if range.num_days() > max_days {
        return Err(Error::validation_code(
            ValidationErrorCode::InvalidRange,
            format!(
                "{} granularity supports at most {} days, got {}",
                granularity,
                max_days,
                range.num_days()
            ),
        ));
    }
    Ok(())
}

fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_TOP_PAGES_LIMIT)
}
