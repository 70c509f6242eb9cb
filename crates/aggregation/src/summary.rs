//! Headline numbers for a date range.

use analytics_core::{EventRow, EventType, VisitRow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Visit totals, engagement and bounce rate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_visits: u64,
    pub unique_sessions: u64,
    /// Mean over visits with a recorded exit, one decimal
    pub avg_time_on_page_seconds: f64,
    /// Percentage of exited visits that bounced, one decimal
    pub bounce_rate: f64,
}

/// Interaction totals for a date range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventStats {
    pub total_events: u64,
    pub clicks: u64,
    pub scrolls: u64,
}

pub fn summarize(visits: &[VisitRow]) -> AnalyticsSummary {
    let unique_sessions = visits
        .iter()
        .map(|v| v.session_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut exited = 0u64;
    let mut total_seconds = 0i64;
    let mut bounces = 0u64;
    for visit in visits {
        let Some(seconds) = visit.time_on_page_seconds else {
            continue;
        };
        exited += 1;
        total_seconds += seconds;
        if visit.bounced() == Some(true) {
            bounces += 1;
        }
    }

    AnalyticsSummary {
        total_visits: visits.len() as u64,
        unique_sessions: unique_sessions as u64,
        avg_time_on_page_seconds: round1(ratio(total_seconds as f64, exited)),
        bounce_rate: round1(ratio(bounces as f64, exited) * 100.0),
    }
}

pub fn event_stats(events: &[EventRow]) -> EventStats {
    let clicks = events.iter().filter(|e| e.event_type == EventType::Click).count() as u64;
    let scrolls = events.iter().filter(|e| e.event_type == EventType::Scroll).count() as u64;
    EventStats {
        total_events: events.len() as u64,
        clicks,
        scrolls,
    }
}

/// Zero when there is nothing to divide by.
fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
