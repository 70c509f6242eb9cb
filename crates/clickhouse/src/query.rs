//! Range selects feeding the dashboard.

use crate::client::ClickHouseClient;
use crate::health::check_connection;
use crate::schema::tables;
use analytics_core::{
    DateRange, DbErrorCode, EventRow, EventType, Result, RowFilter, RowSource, VisitRow,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use clickhouse::Row;
use serde::Deserialize;
use tracing::{debug, warn};

const VISIT_COLUMNS: &str = "id, session_id, page_path, referrer, utm_source, utm_medium, utm_campaign, \
     device_type, browser, os, os_version, country, entered_at, exited_at, time_on_page_seconds, is_bounce";

const EVENT_COLUMNS: &str =
    "id, visit_id, session_id, event_type, page_path, element_id, scroll_depth_percent, created_at";

/// Visit row as stored. Column order matches [`VISIT_COLUMNS`].
#[derive(Debug, Clone, Row, Deserialize)]
pub struct StoredVisit {
    pub id: String,
    pub session_id: String,
    pub page_path: String,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub os_version: String,
    pub country: Option<String>,
    pub entered_at: i64,
    pub exited_at: Option<i64>,
    pub time_on_page_seconds: Option<i64>,
    pub is_bounce: Option<bool>,
}

/// Event row as stored. Column order matches [`EVENT_COLUMNS`].
#[derive(Debug, Clone, Row, Deserialize)]
pub struct StoredEvent {
    pub id: String,
    pub visit_id: String,
    pub session_id: String,
    pub event_type: String,
    pub page_path: String,
    pub element_id: Option<String>,
    pub scroll_depth_percent: Option<u8>,
    pub created_at: i64,
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

impl From<StoredVisit> for VisitRow {
    fn from(row: StoredVisit) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            page_path: row.page_path,
            referrer: row.referrer,
            utm_source: row.utm_source,
            utm_medium: row.utm_medium,
            utm_campaign: row.utm_campaign,
            device_type: row.device_type,
            browser: row.browser,
            os: row.os,
            os_version: Some(row.os_version).filter(|v| !v.is_empty()),
            country: row.country,
            entered_at: from_millis(row.entered_at),
            exited_at: row.exited_at.map(from_millis),
            time_on_page_seconds: row.time_on_page_seconds,
            is_bounce: row.is_bounce,
        }
    }
}

impl StoredEvent {
    fn into_row(self) -> Option<EventRow> {
        let event_type = match self.event_type.parse::<EventType>() {
            Ok(t) => t,
            Err(_) => {
                warn!(event_id = %self.id, event_type = %self.event_type, "Skipping row with unknown event type");
                return None;
            }
        };
        Some(EventRow {
            id: self.id,
            visit_id: self.visit_id,
            session_id: self.session_id,
            event_type,
            page_path: self.page_path,
            element_id: self.element_id,
            scroll_depth_percent: self.scroll_depth_percent,
            created_at: from_millis(self.created_at),
        })
    }
}

/// `WHERE` clause for a range over `column` plus optional filters.
///
/// Placeholders in order: start, end, then each present filter.
fn where_clause(column: &str, filter: &RowFilter, with_event_type: bool) -> String {
    let mut clause = format!(
        "{column} >= toDateTime64(?, 3, 'UTC') AND {column} < toDateTime64(?, 3, 'UTC')"
    );
    if filter.page_path.is_some() {
        clause.push_str(" AND page_path = ?");
    }
    if with_event_type && filter.event_type.is_some() {
        clause.push_str(" AND event_type = ?");
    }
    clause
}

fn range_bounds(range: &DateRange) -> (String, String) {
    let fmt = "%Y-%m-%d %H:%M:%S%.3f";
    (
        range.start().format(fmt).to_string(),
        range.end_exclusive().format(fmt).to_string(),
    )
}

#[async_trait]
impl RowSource for ClickHouseClient {
    async fn query_visits(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<VisitRow>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY entered_at",
            VISIT_COLUMNS,
            self.table(tables::VISITS),
            where_clause("entered_at", filter, false)
        );
        let (start, end) = range_bounds(range);
        let mut query = self.inner().query(&sql).bind(start).bind(end);
        if let Some(path) = &filter.page_path {
            query = query.bind(path.as_str());
        }

        let rows: Vec<StoredVisit> = self
            .timed(DbErrorCode::QueryFailed, query.fetch_all())
            .await?;
        debug!(range = %range, rows = rows.len(), "Visits selected");
        Ok(rows.into_iter().map(VisitRow::from).collect())
    }

    async fn query_events(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<EventRow>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY created_at",
            EVENT_COLUMNS,
            self.table(tables::EVENTS),
            where_clause("created_at", filter, true)
        );
        let (start, end) = range_bounds(range);
        let mut query = self.inner().query(&sql).bind(start).bind(end);
        if let Some(path) = &filter.page_path {
            query = query.bind(path.as_str());
        }
        if let Some(event_type) = filter.event_type {
            query = query.bind(event_type.as_str());
        }

        let rows: Vec<StoredEvent> = self
            .timed(DbErrorCode::QueryFailed, query.fetch_all())
            .await?;
        debug!(range = %range, rows = rows.len(), "Events selected");
        Ok(rows.into_iter().filter_map(StoredEvent::into_row).collect())
    }

    async fn check_connection(&self) -> bool {
        check_connection(self).await
    }
}
