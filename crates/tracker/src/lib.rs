//! Client-side visit tracking.
//!
//! The [`VisitRecorder`] owns one page-view: it opens the visit record,
//! arms the [`EventEmitter`] once the backend has assigned an id, and sends
//! a best-effort exit patch at unload.

pub mod config;
pub mod context;
pub mod emitter;
pub mod recorder;
pub mod storage;

pub use config::TrackerConfig;
pub use context::{VisitContext, VisitHandle};
pub use emitter::EventEmitter;
pub use recorder::{VisitRecorder, VisitState};
pub use storage::FileStorage;
