//! Capabilities of the persistence collaborator.
//!
//! Writes are split in two: [`VisitStore`] is the awaited request path whose
//! failures the caller acts on, [`BeaconTransport`] is the unload path that
//! hands a payload off and never reports back. Reads go through [`RowSource`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::{EventRow, EventType, NewEvent};
use crate::range::DateRange;
use crate::visit::{NewVisit, VisitExit, VisitId, VisitRow};

/// Awaited row inserts.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Insert a visit and return the identifier assigned by the backend.
    async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitId>;

    /// Insert one interaction event.
    async fn insert_event(&self, event: &NewEvent) -> Result<()>;
}

/// Best-effort delivery for the page teardown boundary.
///
/// No confirmation and no retry: the page may be gone before the request
/// completes.
pub trait BeaconTransport: Send + Sync {
    /// Hand the exit patch off. Returns whether it was queued.
    fn send_exit(&self, visit_id: &VisitId, exit: &VisitExit) -> bool;
}

/// Optional narrowing applied to row selects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowFilter {
    pub page_path: Option<String>,
    pub event_type: Option<EventType>,
}

impl RowFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn page(path: impl Into<String>) -> Self {
        Self {
            page_path: Some(path.into()),
            event_type: None,
        }
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn matches_visit(&self, row: &VisitRow) -> bool {
        self.page_path.as_deref().map_or(true, |p| row.page_path == p)
    }

    pub fn matches_event(&self, row: &EventRow) -> bool {
        self.page_path.as_deref().map_or(true, |p| row.page_path == p)
            && self.event_type.map_or(true, |t| row.event_type == t)
    }
}

/// Read side feeding the aggregation layer.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Visits whose `entered_at` falls inside the range.
    async fn query_visits(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<VisitRow>>;

    /// Events whose `created_at` falls inside the range.
    async fn query_events(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<EventRow>>;

    /// Cheap reachability probe used by health checks.
    async fn check_connection(&self) -> bool;
}
