//! In-process counters for the tracker and the query layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Saturates at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 30s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [5, 10, 25, 50, 100, 250, 500, 1000, 2500, 5000, 30000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for visit analytics.
#[derive(Debug, Default)]
pub struct Metrics {
    // Visit recorder
    pub visits_opened: Counter,
    pub visits_failed: Counter,
    pub exits_dispatched: Counter,
    pub exits_failed: Counter,

    // Event emitter
    pub events_sent: Counter,
    pub events_failed: Counter,
    pub events_dropped: Counter,

    // Aggregation queries
    pub queries_served: Counter,
    pub query_failures: Counter,
    pub report_cache_hits: Counter,

    // Latency histograms
    pub creation_latency_ms: Histogram,
    pub query_latency_ms: Histogram,

    // Gauges
    pub open_visits: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub visits_opened: u64,
    pub visits_failed: u64,
    pub exits_dispatched: u64,
    pub exits_failed: u64,
    pub events_sent: u64,
    pub events_failed: u64,
    pub events_dropped: u64,
    pub queries_served: u64,
    pub query_failures: u64,
    pub report_cache_hits: u64,
    pub creation_latency_mean_ms: f64,
    pub query_latency_mean_ms: f64,
    pub open_visits: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            visits_opened: self.visits_opened.get(),
            visits_failed: self.visits_failed.get(),
            exits_dispatched: self.exits_dispatched.get(),
            exits_failed: self.exits_failed.get(),
            events_sent: self.events_sent.get(),
            events_failed: self.events_failed.get(),
            events_dropped: self.events_dropped.get(),
            queries_served: self.queries_served.get(),
            query_failures: self.query_failures.get(),
            report_cache_hits: self.report_cache_hits.get(),
            creation_latency_mean_ms: self.creation_latency_ms.mean(),
            query_latency_mean_ms: self.query_latency_ms.mean(),
            open_visits: self.open_visits.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
