//! Per-visit state shared by the recorder and the emitter.

use analytics_core::{SessionId, VisitId};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Live handle to an open visit.
pub type VisitHandle = Arc<VisitContext>;

/// Created when the visit opens, dropped when it closes.
#[derive(Debug)]
pub struct VisitContext {
    pub visit_id: VisitId,
    pub session_id: SessionId,
    pub page_path: String,
    pub entered_at: DateTime<Utc>,
    /// Highest scroll depth reported so far
    scroll_watermark: AtomicU8,
}

impl VisitContext {
    pub fn new(
        visit_id: VisitId,
        session_id: SessionId,
        page_path: impl Into<String>,
        entered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            visit_id,
            session_id,
            page_path: page_path.into(),
            entered_at,
            scroll_watermark: AtomicU8::new(0),
        }
    }

    pub fn scroll_watermark(&self) -> u8 {
        self.scroll_watermark.load(Ordering::Relaxed)
    }

    /// Raise the watermark to `depth`. Returns false if `depth` is not a new maximum.
    pub fn advance_watermark(&self, depth: u8) -> bool {
        self.scroll_watermark
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                (depth > current).then_some(depth)
            })
            .is_ok()
    }
}
