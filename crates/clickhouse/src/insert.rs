//! Visit and event inserts, and the exit mutation.

use crate::client::ClickHouseClient;
use crate::schema::tables;
use analytics_core::{
    BeaconTransport, DbErrorCode, NewEvent, NewVisit, Result, VisitExit, VisitId, VisitStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clickhouse::Row;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Timestamp literal accepted by `toDateTime64(?, 3, 'UTC')`.
pub(crate) fn ch_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Flattened visit row for insertion.
#[derive(Debug, Clone, Row, Serialize)]
pub struct VisitInsertRow {
    pub id: String,
    pub session_id: String,
    pub page_path: String,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub os_version: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub country: Option<String>,
    pub entered_at: i64, // milliseconds since epoch
    pub exited_at: Option<i64>,
    pub time_on_page_seconds: Option<i64>,
    pub is_bounce: Option<bool>,
}

impl VisitInsertRow {
    pub fn new(id: String, visit: &NewVisit) -> Self {
        Self {
            id,
            session_id: visit.session_id.to_string(),
            page_path: visit.page_path.clone(),
            referrer: visit.referrer.clone(),
            utm_source: visit.utm_source.clone(),
            utm_medium: visit.utm_medium.clone(),
            utm_campaign: visit.utm_campaign.clone(),
            utm_term: visit.utm_term.clone(),
            utm_content: visit.utm_content.clone(),
            device_type: visit.device_type.to_string(),
            browser: visit.browser.clone(),
            os: visit.os.clone(),
            os_version: visit.os_version.clone(),
            screen_width: visit.screen_width,
            screen_height: visit.screen_height,
            country: None,
            entered_at: visit.entered_at.timestamp_millis(),
            exited_at: None,
            time_on_page_seconds: None,
            is_bounce: None,
        }
    }
}

/// Flattened event row for insertion.
#[derive(Debug, Clone, Row, Serialize)]
pub struct EventInsertRow {
    pub id: String,
    pub visit_id: String,
    pub session_id: String,
    pub event_type: String,
    pub page_path: String,
    pub element_id: Option<String>,
    pub element_class: Option<String>,
    pub element_text: Option<String>,
    pub x_position: Option<f64>,
    pub y_position: Option<f64>,
    pub scroll_depth_percent: Option<u8>,
    pub created_at: i64,
}

impl From<&NewEvent> for EventInsertRow {
    fn from(event: &NewEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            visit_id: event.visit_id.to_string(),
            session_id: event.session_id.to_string(),
            event_type: event.event_type.as_str().to_string(),
            page_path: event.page_path.clone(),
            element_id: event.element_id.clone(),
            element_class: event.element_class.clone(),
            element_text: event.element_text.clone(),
            x_position: event.x_position,
            y_position: event.y_position,
            scroll_depth_percent: event.scroll_depth_percent,
            created_at: event.created_at.timestamp_millis(),
        }
    }
}

impl ClickHouseClient {
    async fn insert_row<T: Row + Serialize>(&self, table: &str, row: &T) -> Result<()> {
        let table = self.table(table);
        let write = async {
            let mut insert = self.inner().insert(&table)?;
            insert.write(row).await?;
            insert.end().await
        };
        self.timed(DbErrorCode::StoreFailed, write).await
    }

    /// Apply the exit fields to a visit.
    pub async fn update_exit(&self, visit_id: &VisitId, exit: &VisitExit) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} UPDATE exited_at = toDateTime64(?, 3, 'UTC'), time_on_page_seconds = ?, is_bounce = ? WHERE id = ?",
            self.table(tables::VISITS)
        );
        let mutation = self
            .inner()
            .query(&sql)
            .bind(ch_timestamp(exit.exited_at))
            .bind(exit.time_on_page_seconds)
            .bind(exit.is_bounce)
            .bind(visit_id.as_str())
            .execute();
        self.timed(DbErrorCode::StoreFailed, mutation).await
    }
}

#[async_trait]
impl VisitStore for ClickHouseClient {
    async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitId> {
        let id = Uuid::new_v4().to_string();
        self.insert_row(tables::VISITS, &VisitInsertRow::new(id.clone(), visit))
            .await?;

        debug!(visit_id = %id, page_path = %visit.page_path, "Visit inserted");
        Ok(VisitId::new(id))
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<()> {
        self.insert_row(tables::EVENTS, &EventInsertRow::from(event))
            .await
    }
}

/// Spawned exit mutation. Nothing awaits it.
#[derive(Clone)]
pub struct ClickHouseBeacon {
    client: ClickHouseClient,
}

impl ClickHouseBeacon {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }
}

impl BeaconTransport for ClickHouseBeacon {
    fn send_exit(&self, visit_id: &VisitId, exit: &VisitExit) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!(visit_id = %visit_id, "No async runtime, exit not sent");
            return false;
        };

        let client = self.client.clone();
        let visit_id = visit_id.clone();
        let exit = exit.clone();
        runtime.spawn(async move {
            match client.update_exit(&visit_id, &exit).await {
                Ok(()) => debug!(visit_id = %visit_id, "Exit applied"),
                Err(e) => warn!(visit_id = %visit_id, error = %e, "Exit mutation failed"),
            }
        });
        true
    }
}
