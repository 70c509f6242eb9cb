//! Visit lifecycle for one page load.

use analytics_core::{
    load_or_create_fingerprint, new_session_id, BeaconTransport, DbErrorCode, DeviceProfiler,
    DurableStorage, EnvironmentSnapshot, Error, FingerprintInputs, NewVisit, PageLocation,
    PageSignal, Result, SessionId, VisitExit, VisitId, VisitStore,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::config::TrackerConfig;
use crate::context::{VisitContext, VisitHandle};
use crate::emitter::EventEmitter;

/// Recorder lifecycle.
///
/// `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Uninitialized,
    Opening,
    Open,
    Closing,
    Closed,
    Failed,
}

impl VisitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

struct Inner {
    state: VisitState,
    context: Option<VisitHandle>,
    emitter: Option<EventEmitter>,
    /// Unload seen while the creation write was in flight
    close_pending: bool,
}

/// Owns the visit record of a single page load.
///
/// The creation write is awaited; only once it returns an id is the
/// [`EventEmitter`] armed. The exit goes out through the beacon transport
/// and is never awaited.
pub struct VisitRecorder {
    env: Arc<dyn EnvironmentSnapshot>,
    store: Arc<dyn VisitStore>,
    beacon: Arc<dyn BeaconTransport>,
    profiler: DeviceProfiler,
    config: TrackerConfig,
    session_id: SessionId,
    inner: Mutex<Inner>,
}

impl VisitRecorder {
    pub fn new(
        env: Arc<dyn EnvironmentSnapshot>,
        store: Arc<dyn VisitStore>,
        beacon: Arc<dyn BeaconTransport>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            env,
            store,
            beacon,
            profiler: DeviceProfiler::new(),
            config,
            session_id: new_session_id(),
            inner: Mutex::new(Inner {
                state: VisitState::Uninitialized,
                context: None,
                emitter: None,
                close_pending: false,
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Long-lived device fingerprint, persisted in `storage` on first use.
    pub fn fingerprint(&self, storage: &dyn DurableStorage) -> String {
        load_or_create_fingerprint(storage, &FingerprintInputs::from_environment(self.env.as_ref()))
    }

    pub fn state(&self) -> VisitState {
        self.inner.lock().state
    }

    /// Handle of the open visit, if any.
    pub fn handle(&self) -> Option<VisitHandle> {
        self.inner.lock().context.clone()
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().emitter.is_some()
    }

    /// Create the visit record and arm instrumentation.
    ///
    /// Only the first call does any work; later calls return the current
    /// handle. On failure the recorder stays disabled for the page lifetime.
    /// A close requested while the write was in flight runs right after it
    /// succeeds.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn open(&self) -> Option<VisitHandle> {
        {
            let mut inner = self.inner.lock();
            if inner.state != VisitState::Uninitialized {
                debug!(state = inner.state.as_str(), "Visit already started");
                return inner.context.clone();
            }
            inner.state = VisitState::Opening;
        }

        let visit = self.build_visit();
        let start = Instant::now();

        match self.create(&visit).await {
            Ok(visit_id) => {
                metrics()
                    .creation_latency_ms
                    .observe(start.elapsed().as_millis() as u64);
                metrics().visits_opened.inc();
                metrics().open_visits.inc();

                let context = Arc::new(VisitContext::new(
                    visit_id,
                    self.session_id.clone(),
                    visit.page_path.clone(),
                    visit.entered_at,
                ));
                let close_pending = self.arm(context.clone());

                info!(
                    visit_id = %context.visit_id,
                    page_path = %context.page_path,
                    device_type = %visit.device_type,
                    "Visit opened"
                );
                if close_pending {
                    debug!(visit_id = %context.visit_id, "Page left during creation, closing");
                    self.close();
                }
                Some(context)
            }
            Err(e) => {
                self.inner.lock().state = VisitState::Failed;
                metrics().visits_failed.inc();
                warn!(
                    error = %e,
                    code = e.error_code().unwrap_or("UNKNOWN"),
                    "Visit creation failed, tracking disabled"
                );
                None
            }
        }
    }

    /// Route a page signal.
    ///
    /// Returns the spawned event send, if one was started. No-op unless open.
    pub fn handle_signal(&self, signal: PageSignal) -> Option<JoinHandle<()>> {
        match signal {
            PageSignal::Click(click) => self.emitter()?.on_click(&click),
            PageSignal::Scroll => self.emitter()?.on_scroll(),
            PageSignal::Unload => {
                self.close();
                None
            }
            PageSignal::VisibilityHidden if self.config.exit_on_hidden => {
                self.close();
                None
            }
            PageSignal::VisibilityHidden | PageSignal::VisibilityVisible => None,
        }
    }

    /// Record the exit and stop instrumentation.
    ///
    /// Returns whether an exit patch was handed to the beacon. Only the first
    /// close of an open visit dispatches anything; a close while opening is
    /// deferred until the visit has an id.
    pub fn close(&self) -> bool {
        let context = {
            let mut inner = self.inner.lock();
            if inner.state == VisitState::Opening {
                debug!("Close deferred until the visit is created");
                inner.close_pending = true;
                return false;
            }
            if inner.state != VisitState::Open {
                debug!(state = inner.state.as_str(), "Close ignored");
                return false;
            }
            inner.state = VisitState::Closing;
            match inner.context.take() {
                Some(context) => context,
                None => {
                    inner.state = VisitState::Closed;
                    return false;
                }
            }
        };
        self.disarm();

        let exit = VisitExit::with_threshold(
            context.entered_at,
            self.env.now(),
            self.config.bounce_threshold_secs,
        );
        let queued = self.beacon.send_exit(&context.visit_id, &exit);

        if queued {
            metrics().exits_dispatched.inc();
            debug!(
                visit_id = %context.visit_id,
                time_on_page_seconds = exit.time_on_page_seconds,
                is_bounce = exit.is_bounce,
                "Exit dispatched"
            );
        } else {
            metrics().exits_failed.inc();
            warn!(visit_id = %context.visit_id, "Exit could not be queued");
        }

        self.inner.lock().state = VisitState::Closed;
        metrics().open_visits.dec();
        queued
    }

    fn build_visit(&self) -> NewVisit {
        let profile = self.profiler.profile_environment(self.env.as_ref());
        NewVisit::new(
            self.session_id.clone(),
            PageLocation::parse(&self.env.current_url()),
            self.env.referrer(),
            profile,
            self.env.now(),
        )
    }

    async fn create(&self, visit: &NewVisit) -> Result<VisitId> {
        visit
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        tokio::time::timeout(self.config.creation_timeout(), self.store.insert_visit(visit))
            .await
            .map_err(|_| {
                Error::database(
                    DbErrorCode::Timeout,
                    format!(
                        "visit creation exceeded {}ms",
                        self.config.creation_timeout_ms
                    ),
                )
            })?
    }

    fn emitter(&self) -> Option<EventEmitter> {
        self.inner.lock().emitter.clone()
    }

    /// Returns whether a close arrived while opening.
    fn arm(&self, context: VisitHandle) -> bool {
        let emitter = EventEmitter::new(context.clone(), self.store.clone(), self.env.clone());
        let mut inner = self.inner.lock();
        inner.context = Some(context);
        inner.emitter = Some(emitter);
        inner.state = VisitState::Open;
        std::mem::take(&mut inner.close_pending)
    }

    fn disarm(&self) {
        self.inner.lock().emitter = None;
    }
}
