//! Internal telemetry for visit analytics.
//!
//! Counters and health live in-process; there is no external metrics
//! exporter. Operators read them through the dashboard API.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
