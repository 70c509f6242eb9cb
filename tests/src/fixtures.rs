//! Test fixtures: user agents, browser environments and stored rows.

use analytics_core::{
    DateRange, DeviceProfile, DeviceType, EventRow, EventType, NewVisit, PageLocation, SessionId,
    StaticEnvironment, VisitRow,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
pub const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

/// Day every fixture lives on.
pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Query string form of [`day`].
pub const DAY: &str = "2026-10-19";

pub fn day_range() -> DateRange {
    DateRange::day(day())
}

/// Instant on the fixture day.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
}

/// A browser tab with a pinned clock.
pub fn browser(user_agent: &str, url: &str, now: DateTime<Utc>) -> Arc<StaticEnvironment> {
    Arc::new(
        StaticEnvironment::new(user_agent, url)
            .with_referrer("https://search.example/?q=pricing")
            .with_timezone("Europe/Amsterdam")
            .with_now(now),
    )
}

/// Desktop Chrome on the pricing page, arriving from a newsletter.
pub fn pricing_tab(now: DateTime<Utc>) -> Arc<StaticEnvironment> {
    browser(
        CHROME_MAC,
        "https://example.com/pricing?utm_source=newsletter&utm_campaign=fall",
        now,
    )
}

/// Creation record as the tracker would build it.
pub fn new_visit(path: &str, entered_at: DateTime<Utc>) -> NewVisit {
    NewVisit::new(
        SessionId::from(Uuid::new_v4().to_string()),
        PageLocation::parse(&format!("https://example.com{}", path)),
        None,
        DeviceProfile {
            device_type: DeviceType::Desktop,
            browser: "Chrome".to_string(),
            os: "Mac OSX".to_string(),
            os_version: "10.15.7".to_string(),
            screen_width: 1440,
            screen_height: 900,
        },
        entered_at,
    )
}

/// Stored visit; `duration` of `None` means the exit never landed.
pub fn visit_row(
    path: &str,
    device: &str,
    browser: &str,
    entered_at: DateTime<Utc>,
    duration: Option<i64>,
) -> VisitRow {
    VisitRow {
        id: Uuid::new_v4().to_string(),
        session_id: Uuid::new_v4().to_string(),
        page_path: path.to_string(),
        referrer: None,
        utm_source: None,
        utm_medium: None,
        utm_campaign: None,
        device_type: device.to_string(),
        browser: browser.to_string(),
        os: "Linux".to_string(),
        os_version: None,
        country: None,
        entered_at,
        exited_at: duration.map(|secs| entered_at + chrono::Duration::seconds(secs)),
        time_on_page_seconds: duration,
        is_bounce: duration.map(|secs| secs < 10),
    }
}

pub fn with_country(mut row: VisitRow, country: &str) -> VisitRow {
    row.country = Some(country.to_string());
    row
}

pub fn with_session(mut row: VisitRow, session_id: &str) -> VisitRow {
    row.session_id = session_id.to_string();
    row
}

/// Stored event for an existing visit.
pub fn event_row(visit: &VisitRow, event_type: EventType, created_at: DateTime<Utc>) -> EventRow {
    EventRow {
        id: Uuid::new_v4().to_string(),
        visit_id: visit.id.clone(),
        session_id: visit.session_id.clone(),
        event_type,
        page_path: visit.page_path.clone(),
        element_id: None,
        scroll_depth_percent: (event_type == EventType::Scroll).then_some(50),
        created_at,
    }
}

/// Five visits on [`day`]:
///
/// | path      | device  | browser | duration | country |
/// |-----------|---------|---------|----------|---------|
/// | /         | desktop | Chrome  | 30s      | NL      |
/// | /         | mobile  | Safari  | 4s       | US      |
/// | /pricing  | desktop | Chrome  | 120s     | NL      |
/// | /pricing  | desktop | Firefox | open     | -       |
/// | /blog     | tablet  | Safari  | 10s      | DE      |
///
/// Two of them share a session.
pub fn sample_visits() -> Vec<VisitRow> {
    vec![
        with_session(
            with_country(visit_row("/", "desktop", "Chrome", at(8, 5), Some(30)), "NL"),
            "session-a",
        ),
        with_country(visit_row("/", "mobile", "Safari", at(9, 10), Some(4)), "US"),
        with_session(
            with_country(visit_row("/pricing", "desktop", "Chrome", at(9, 40), Some(120)), "NL"),
            "session-a",
        ),
        visit_row("/pricing", "desktop", "Firefox", at(14, 0), None),
        with_country(visit_row("/blog", "tablet", "Safari", at(21, 30), Some(10)), "DE"),
    ]
}
