//! Zero-filled visit counts per time bucket.

use analytics_core::{DateRange, Granularity, VisitRow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket start, UTC. Hour labels repeat across days; this does not.
    pub start: NaiveDateTime,
    pub label: String,
    pub count: u64,
}

/// One point per bucket overlapping `range`, in order, including empty ones.
pub fn time_series(visits: &[VisitRow], range: &DateRange, granularity: Granularity) -> Vec<TimeSeriesPoint> {
    let starts = granularity.bucket_starts(range);
    let index: HashMap<NaiveDateTime, usize> =
        starts.iter().enumerate().map(|(i, start)| (*start, i)).collect();

    let mut counts = vec![0u64; starts.len()];
    for visit in visits.iter().filter(|v| range.contains(v.entered_at)) {
        let bucket = granularity.bucket_start(visit.entered_at.naive_utc());
        if let Some(&i) = index.get(&bucket) {
            counts[i] += 1;
        }
    }

    starts
        .into_iter()
        .zip(counts)
        .map(|(start, count)| TimeSeriesPoint {
            start,
            label: granularity.label(start),
            count,
        })
        .collect()
}
