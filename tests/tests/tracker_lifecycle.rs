//! Page-view lifecycle through the tracker, read back through the API.
//!
//! The recorder writes into the shared `MockStore`; the dashboard router
//! aggregates those same rows.

use analytics_core::{ClickSignal, ElementInfo, EventType, PageSignal};
use chrono::Duration;
use integration_tests::{fixtures, setup::TestContext};
use tracker::{FileStorage, TrackerConfig, VisitState};

fn buy_click() -> ClickSignal {
    ClickSignal::new(
        vec![
            ElementInfo::new("span").with_text("Buy now"),
            ElementInfo::new("button").with_id("buy").with_class("btn primary"),
        ],
        40.0,
        300.0,
    )
}

#[tokio::test]
async fn test_page_view_is_recorded_end_to_end() {
    let ctx = TestContext::new();
    let tab = fixtures::pricing_tab(fixtures::at(10, 0));
    let recorder = ctx.recorder(tab.clone(), TrackerConfig::default());

    let handle = recorder.open().await.expect("visit should open");
    assert_eq!(recorder.state(), VisitState::Open);
    assert!(recorder.is_armed());

    let visits = ctx.store.captured_visits();
    assert_eq!(visits.len(), 1);
    let (id, visit) = &visits[0];
    assert_eq!(id, &handle.visit_id);
    assert_eq!(visit.page_path, "/pricing");
    assert_eq!(visit.utm_source.as_deref(), Some("newsletter"));
    assert_eq!(visit.utm_campaign.as_deref(), Some("fall"));
    assert_eq!(
        visit.referrer.as_deref(),
        Some("https://search.example/?q=pricing")
    );
    assert_eq!(visit.browser, "Chrome");
    assert_eq!(visit.entered_at, fixtures::at(10, 0));

    // Scrolling back up never reports.
    for (top, reported) in [(300.0, true), (100.0, false), (1000.0, true)] {
        tab.scroll_to(top, 2000.0, 1000.0);
        let send = recorder.handle_signal(PageSignal::Scroll);
        assert_eq!(send.is_some(), reported, "scroll_top {}", top);
        if let Some(send) = send {
            send.await.unwrap();
        }
    }

    recorder
        .handle_signal(PageSignal::Click(buy_click()))
        .expect("click on a button is reported")
        .await
        .unwrap();

    tab.advance(Duration::seconds(42));
    assert!(recorder.handle_signal(PageSignal::Unload).is_none());
    assert_eq!(recorder.state(), VisitState::Closed);
    assert!(!recorder.is_armed());

    let events = ctx.store.captured_events();
    let depths: Vec<u8> = events.iter().filter_map(|e| e.scroll_depth_percent).collect();
    assert_eq!(depths, vec![30, 100]);
    let click = events
        .iter()
        .find(|e| e.event_type == EventType::Click)
        .expect("click event");
    assert_eq!(click.element_id.as_deref(), Some("buy"));
    assert_eq!(click.visit_id, handle.visit_id);

    let exits = ctx.store.captured_exits();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].1.time_on_page_seconds, 42);
    assert!(!exits[0].1.is_bounce);

    let body: serde_json::Value = ctx
        .server()
        .get("/api/analytics/summary")
        .add_query_param("from", fixtures::DAY)
        .add_query_param("to", fixtures::DAY)
        .await
        .json();
    assert_eq!(body["summary"]["total_visits"], 1);
    assert_eq!(body["summary"]["avg_time_on_page_seconds"], 42.0);
    assert_eq!(body["summary"]["bounce_rate"], 0.0);
    assert_eq!(body["events"]["clicks"], 1);
    assert_eq!(body["events"]["scrolls"], 2);
}

#[tokio::test]
async fn test_short_visit_is_a_bounce() {
    let ctx = TestContext::new();
    let tab = fixtures::browser(
        fixtures::SAFARI_IPHONE,
        "https://example.com/blog",
        fixtures::at(12, 0),
    );
    let recorder = ctx.recorder(tab.clone(), TrackerConfig::default());
    recorder.open().await.expect("visit should open");

    tab.advance(Duration::seconds(3));
    recorder.handle_signal(PageSignal::Unload);
    // A second unload dispatches nothing.
    assert!(!recorder.close());

    let exits = ctx.store.captured_exits();
    assert_eq!(exits.len(), 1);
    assert!(exits[0].1.is_bounce);

    let body: serde_json::Value = ctx
        .server()
        .get("/api/analytics/breakdown/device")
        .add_query_param("from", fixtures::DAY)
        .add_query_param("to", fixtures::DAY)
        .await
        .json();
    assert_eq!(body["entries"][0]["value"], "mobile");
    assert_eq!(body["entries"][0]["count"], 1);
}

#[tokio::test]
async fn test_failed_creation_disables_tracking() {
    let ctx = TestContext::new();
    ctx.store.set_fail_writes(true);

    let tab = fixtures::pricing_tab(fixtures::at(10, 0));
    let recorder = ctx.recorder(tab.clone(), TrackerConfig::default());

    assert!(recorder.open().await.is_none());
    assert_eq!(recorder.state(), VisitState::Failed);
    assert!(!recorder.is_armed());

    tab.scroll_to(800.0, 2000.0, 1000.0);
    assert!(recorder.handle_signal(PageSignal::Scroll).is_none());
    assert!(recorder.handle_signal(PageSignal::Click(buy_click())).is_none());
    recorder.handle_signal(PageSignal::Unload);

    assert!(ctx.store.captured_visits().is_empty());
    assert!(ctx.store.captured_events().is_empty());
    assert!(ctx.store.captured_exits().is_empty());
    // Retrying is not possible for this page load.
    assert!(recorder.open().await.is_none());
}

#[tokio::test]
async fn test_hidden_page_policy() {
    let ctx = TestContext::new();

    let keeps_open = ctx.recorder(
        fixtures::pricing_tab(fixtures::at(10, 0)),
        TrackerConfig::default(),
    );
    keeps_open.open().await.expect("visit should open");
    keeps_open.handle_signal(PageSignal::VisibilityHidden);
    assert_eq!(keeps_open.state(), VisitState::Open);

    let closes = ctx.recorder(
        fixtures::pricing_tab(fixtures::at(10, 0)),
        TrackerConfig::default().with_exit_on_hidden(true),
    );
    closes.open().await.expect("visit should open");
    closes.handle_signal(PageSignal::VisibilityHidden);
    assert_eq!(closes.state(), VisitState::Closed);

    assert_eq!(ctx.store.captured_exits().len(), 1);
}

#[tokio::test]
async fn test_fingerprint_survives_reload() {
    let path = std::env::temp_dir().join(format!("fingerprint-{}.json", uuid::Uuid::new_v4()));
    let ctx = TestContext::new();

    let first = ctx.recorder(
        fixtures::pricing_tab(fixtures::at(10, 0)),
        TrackerConfig::default(),
    );
    let fingerprint = first.fingerprint(&FileStorage::open(&path));

    // A new page load gets a new session but keeps the fingerprint.
    let second = ctx.recorder(
        fixtures::pricing_tab(fixtures::at(11, 0)),
        TrackerConfig::default(),
    );
    assert_ne!(first.session_id(), second.session_id());
    assert_eq!(second.fingerprint(&FileStorage::open(&path)), fingerprint);

    let _ = std::fs::remove_file(&path);
}
