//! Click and scroll instrumentation for an open visit.

use analytics_core::{ClickSignal, EnvironmentSnapshot, NewEvent, VisitStore};
use std::sync::Arc;
use telemetry::metrics;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use validator::Validate;

use crate::context::VisitContext;

/// Turns page interactions into events for one visit.
///
/// Only exists while the visit is open, so every event it sends carries a
/// `visit_id` the backend already knows. Sends are spawned; nothing here
/// blocks or fails the calling handler.
#[derive(Clone)]
pub struct EventEmitter {
    context: Arc<VisitContext>,
    store: Arc<dyn VisitStore>,
    env: Arc<dyn EnvironmentSnapshot>,
}

impl EventEmitter {
    pub fn new(
        context: Arc<VisitContext>,
        store: Arc<dyn VisitStore>,
        env: Arc<dyn EnvironmentSnapshot>,
    ) -> Self {
        Self { context, store, env }
    }

    /// Report a click on the nearest interactive element, if any.
    pub fn on_click(&self, click: &ClickSignal) -> Option<JoinHandle<()>> {
        let Some(target) = click.interactive_target() else {
            trace!("Click without interactive target ignored");
            return None;
        };

        let event = NewEvent::click(
            self.context.visit_id.clone(),
            self.context.session_id.clone(),
            self.context.page_path.clone(),
            target,
            click.x,
            click.y,
            self.env.now(),
        );
        self.dispatch(event)
    }

    /// Report the current scroll depth if it beats the watermark.
    pub fn on_scroll(&self) -> Option<JoinHandle<()>> {
        let depth = self.env.scroll_metrics().depth_percent()?;
        if !self.context.advance_watermark(depth) {
            return None;
        }

        let event = NewEvent::scroll(
            self.context.visit_id.clone(),
            self.context.session_id.clone(),
            self.context.page_path.clone(),
            depth,
            self.env.now(),
        );
        self.dispatch(event)
    }

    fn dispatch(&self, event: NewEvent) -> Option<JoinHandle<()>> {
        if let Err(e) = event.validate() {
            metrics().events_dropped.inc();
            warn!(
                visit_id = %self.context.visit_id,
                event_type = %event.event_type,
                error = %e,
                "Dropping invalid event"
            );
            return None;
        }

        let Ok(runtime) = Handle::try_current() else {
            metrics().events_dropped.inc();
            warn!(event_type = %event.event_type, "No async runtime, event dropped");
            return None;
        };

        let store = self.store.clone();
        Some(runtime.spawn(async move {
            match store.insert_event(&event).await {
                Ok(()) => {
                    metrics().events_sent.inc();
                    debug!(
                        visit_id = %event.visit_id,
                        event_type = %event.event_type,
                        "Event recorded"
                    );
                }
                Err(e) => {
                    metrics().events_failed.inc();
                    warn!(
                        visit_id = %event.visit_id,
                        event_type = %event.event_type,
                        error = %e,
                        "Failed to record event"
                    );
                }
            }
        }))
    }
}
