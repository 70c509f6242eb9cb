//! Mock implementations for testing.

use analytics_core::{
    BeaconTransport, DateRange, DbErrorCode, Error, EventRow, NewEvent, NewVisit, Result,
    RowFilter, RowSource, VisitExit, VisitId, VisitRow, VisitStore,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct MockState {
    visits: Vec<(VisitId, NewVisit)>,
    exits: Vec<(VisitId, VisitExit)>,
    events: Vec<NewEvent>,
    seeded_visits: Vec<VisitRow>,
    seeded_events: Vec<EventRow>,
    fail_writes: bool,
    fail_reads: Option<DbErrorCode>,
    unreachable: bool,
    selects: usize,
}

/// In-memory backend that captures writes and serves them back as rows.
///
/// Implements the same capabilities as the REST and ClickHouse backends, so
/// a tracker and the query API can share one instance: visits the tracker
/// records show up in the dashboard aggregations.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits captured through [`VisitStore::insert_visit`].
    pub fn captured_visits(&self) -> Vec<(VisitId, NewVisit)> {
        self.state.lock().visits.clone()
    }

    /// Exits handed to the beacon.
    pub fn captured_exits(&self) -> Vec<(VisitId, VisitExit)> {
        self.state.lock().exits.clone()
    }

    pub fn captured_events(&self) -> Vec<NewEvent> {
        self.state.lock().events.clone()
    }

    /// Rows served in addition to the captured writes.
    pub fn seed_visits(&self, rows: impl IntoIterator<Item = VisitRow>) {
        self.state.lock().seeded_visits.extend(rows);
    }

    pub fn seed_events(&self, rows: impl IntoIterator<Item = EventRow>) {
        self.state.lock().seeded_events.extend(rows);
    }

    /// Number of row selects served, failed ones included.
    pub fn select_count(&self) -> usize {
        self.state.lock().selects
    }

    /// Make inserts fail with `DB_001`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make selects fail with the given code, or succeed again with `None`.
    pub fn set_fail_reads(&self, code: Option<DbErrorCode>) {
        self.state.lock().fail_reads = code;
    }

    /// Make the connection probe fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    fn visit_rows(state: &MockState) -> Vec<VisitRow> {
        let captured = state.visits.iter().map(|(id, visit)| {
            // The first exit wins; later patches are ignored like a write-once column.
            let exit = state
                .exits
                .iter()
                .find(|(exit_id, _)| exit_id == id)
                .map(|(_, exit)| exit);
            visit_row(id, visit, exit)
        });
        state.seeded_visits.iter().cloned().chain(captured).collect()
    }

    fn event_rows(state: &MockState) -> Vec<EventRow> {
        let captured = state
            .events
            .iter()
            .enumerate()
            .map(|(i, event)| event_row(format!("event-{}", i + 1), event));
        state.seeded_events.iter().cloned().chain(captured).collect()
    }
}

/// Read-side shape of a captured visit.
pub fn visit_row(id: &VisitId, visit: &NewVisit, exit: Option<&VisitExit>) -> VisitRow {
    VisitRow {
        id: id.to_string(),
        session_id: visit.session_id.to_string(),
        page_path: visit.page_path.clone(),
        referrer: visit.referrer.clone(),
        utm_source: visit.utm_source.clone(),
        utm_medium: visit.utm_medium.clone(),
        utm_campaign: visit.utm_campaign.clone(),
        device_type: visit.device_type.to_string(),
        browser: visit.browser.clone(),
        os: visit.os.clone(),
        os_version: Some(visit.os_version.clone()).filter(|v| !v.is_empty()),
        country: None,
        entered_at: visit.entered_at,
        exited_at: exit.map(|e| e.exited_at),
        time_on_page_seconds: exit.map(|e| e.time_on_page_seconds),
        is_bounce: exit.map(|e| e.is_bounce),
    }
}

/// Read-side shape of a captured event.
pub fn event_row(id: String, event: &NewEvent) -> EventRow {
    EventRow {
        id,
        visit_id: event.visit_id.to_string(),
        session_id: event.session_id.to_string(),
        event_type: event.event_type,
        page_path: event.page_path.clone(),
        element_id: event.element_id.clone(),
        scroll_depth_percent: event.scroll_depth_percent,
        created_at: event.created_at,
    }
}

#[async_trait]
impl VisitStore for MockStore {
    async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitId> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(Error::database(DbErrorCode::StoreFailed, "Mock store failure"));
        }
        let id = VisitId::new(format!("visit-{}", state.visits.len() + 1));
        state.visits.push((id.clone(), visit.clone()));
        Ok(id)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(Error::database(DbErrorCode::StoreFailed, "Mock store failure"));
        }
        state.events.push(event.clone());
        Ok(())
    }
}

impl BeaconTransport for MockStore {
    fn send_exit(&self, visit_id: &VisitId, exit: &VisitExit) -> bool {
        self.state.lock().exits.push((visit_id.clone(), exit.clone()));
        true
    }
}

#[async_trait]
impl RowSource for MockStore {
    async fn query_visits(&self, _range: &DateRange, _filter: &RowFilter) -> Result<Vec<VisitRow>> {
        let mut state = self.state.lock();
        state.selects += 1;
        if let Some(code) = state.fail_reads {
            return Err(Error::database(code, "Mock select failure"));
        }
        Ok(Self::visit_rows(&state))
    }

    async fn query_events(&self, _range: &DateRange, _filter: &RowFilter) -> Result<Vec<EventRow>> {
        let mut state = self.state.lock();
        state.selects += 1;
        if let Some(code) = state.fail_reads {
            return Err(Error::database(code, "Mock select failure"));
        }
        Ok(Self::event_rows(&state))
    }

    async fn check_connection(&self) -> bool {
        !self.state.lock().unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_mock_store_serves_captured_visits() {
        let store = MockStore::new();
        let visit = fixtures::new_visit("/pricing", fixtures::at(9, 0));

        let id = store.insert_visit(&visit).await.unwrap();
        assert_eq!(id.as_str(), "visit-1");

        let exit = VisitExit::compute(visit.entered_at, fixtures::at(9, 1));
        assert!(store.send_exit(&id, &exit));

        let rows = store
            .query_visits(&fixtures::day_range(), &RowFilter::none())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time_on_page_seconds, Some(60));
        assert_eq!(rows[0].is_bounce, Some(false));
        assert_eq!(store.select_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_failure_modes() {
        let store = MockStore::new();
        store.set_fail_writes(true);
        let err = store
            .insert_visit(&fixtures::new_visit("/", fixtures::at(9, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("DB_001"));

        store.set_fail_reads(Some(DbErrorCode::Unavailable));
        let err = store
            .query_events(&fixtures::day_range(), &RowFilter::none())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("DB_004"));

        store.set_unreachable(true);
        assert!(!store.check_connection().await);
    }
}
