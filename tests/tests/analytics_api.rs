//! Dashboard endpoints over seeded rows.

use analytics_core::{DbErrorCode, EventType};
use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;
use std::time::Duration;
use telemetry::metrics;

fn seeded() -> (TestContext, TestServer) {
    let ctx = TestContext::new();
    let visits = fixtures::sample_visits();
    ctx.store.seed_events(vec![
        fixtures::event_row(&visits[0], EventType::Click, fixtures::at(8, 6)),
        fixtures::event_row(&visits[0], EventType::Scroll, fixtures::at(8, 7)),
        fixtures::event_row(&visits[2], EventType::Click, fixtures::at(9, 41)),
    ]);
    ctx.store.seed_visits(visits);
    let server = ctx.server();
    (ctx, server)
}

async fn get(server: &TestServer, path: &str, params: &[(&str, &str)]) -> axum_test::TestResponse {
    let mut request = server.get(path);
    for &(key, value) in params {
        request = request.add_query_param(key, value);
    }
    request.await
}

const DAY: [(&str, &str); 2] = [("from", fixtures::DAY), ("to", fixtures::DAY)];

#[tokio::test]
async fn test_summary() {
    let (_ctx, server) = seeded();

    let response = get(&server, "/api/analytics/summary", &DAY).await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["from"], fixtures::DAY);
    assert_eq!(body["summary"]["total_visits"], 5);
    assert_eq!(body["summary"]["unique_sessions"], 4);
    // (30 + 4 + 120 + 10) / 4 exited visits
    assert_eq!(body["summary"]["avg_time_on_page_seconds"], 41.0);
    // Only the 4s visit bounced; exactly 10s does not.
    assert_eq!(body["summary"]["bounce_rate"], 25.0);
    assert_eq!(body["events"]["total_events"], 3);
    assert_eq!(body["events"]["clicks"], 2);
}

#[tokio::test]
async fn test_empty_range_yields_zeroes() {
    let (_ctx, server) = seeded();

    let body: Value = get(
        &server,
        "/api/analytics/summary",
        &[("from", "2026-09-01"), ("to", "2026-09-02")],
    )
    .await
    .json();
    assert_eq!(body["summary"]["total_visits"], 0);
    assert_eq!(body["summary"]["avg_time_on_page_seconds"], 0.0);
    assert_eq!(body["summary"]["bounce_rate"], 0.0);
}

#[tokio::test]
async fn test_hourly_series_is_zero_filled() {
    let (_ctx, server) = seeded();

    let mut params = DAY.to_vec();
    params.push(("granularity", "hour"));
    let body: Value = get(&server, "/api/analytics/timeseries", &params).await.json();

    assert_eq!(body["granularity"], "hour");
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 24);
    assert_eq!(points[0]["label"], "00:00");
    assert_eq!(points[0]["count"], 0);
    assert_eq!(points[9]["count"], 2);
    let total: u64 = points.iter().map(|p| p["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_daily_series_labels() {
    let (_ctx, server) = seeded();

    let body: Value = get(
        &server,
        "/api/analytics/timeseries",
        &[("from", "2026-10-18"), ("to", "2026-10-20")],
    )
    .await
    .json();
    let labels: Vec<&str> = body["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["10/18", "10/19", "10/20"]);
    assert_eq!(body["points"][1]["count"], 5);
}

#[tokio::test]
async fn test_breakdowns() {
    let (_ctx, server) = seeded();

    let body: Value = get(&server, "/api/analytics/breakdown/browser", &DAY).await.json();
    assert_eq!(body["dimension"], "browser");
    let entries = body["entries"].as_array().unwrap();
    // Chrome and Safari tie; Chrome was seen first.
    assert_eq!(entries[0]["value"], "Chrome");
    assert_eq!(entries[1]["value"], "Safari");
    assert_eq!(entries[2]["value"], "Firefox");

    let body: Value = get(&server, "/api/analytics/breakdown/country", &DAY).await.json();
    let countries: Vec<&str> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["value"].as_str().unwrap())
        .collect();
    assert_eq!(countries, vec!["NL", "US", "unknown", "DE"]);
}

#[tokio::test]
async fn test_unknown_dimension_is_rejected() {
    let (_ctx, server) = seeded();

    let response = get(&server, "/api/analytics/breakdown/planet", &DAY).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_top_pages_and_page_filter() {
    let (_ctx, server) = seeded();

    let mut params = DAY.to_vec();
    params.push(("limit", "2"));
    let body: Value = get(&server, "/api/analytics/pages", &params).await.json();
    let pages = body["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["page_path"], "/");
    assert_eq!(pages[0]["views"], 2);
    assert_eq!(pages[1]["page_path"], "/pricing");

    let mut params = DAY.to_vec();
    params.push(("page", "/pricing"));
    let body: Value = get(&server, "/api/analytics/summary", &params).await.json();
    assert_eq!(body["summary"]["total_visits"], 2);
    assert_eq!(body["events"]["total_events"], 1);
}

#[tokio::test]
async fn test_report_is_cached() {
    let (ctx, server) = seeded();
    let hits_before = metrics().report_cache_hits.get();

    let first = get(&server, "/api/analytics/report", &DAY).await;
    first.assert_status_ok();
    let selects = ctx.store.select_count();
    assert_eq!(selects, 2);

    let second = get(&server, "/api/analytics/report", &DAY).await;
    second.assert_status_ok();
    assert_eq!(ctx.store.select_count(), selects);
    assert!(metrics().report_cache_hits.get() > hits_before);

    let body: Value = second.json();
    assert_eq!(body["summary"]["total_visits"], 5);
    assert_eq!(body["devices"][0]["device_type"], "desktop");
    assert_eq!(body["devices"][0]["count"], 3);
    assert_eq!(body["top_pages"].as_array().unwrap().len(), 3);
    assert_eq!(body["time_series"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_report_is_not_cached() {
    let ctx = TestContext::with_cache_ttl(Duration::from_secs(60));
    let server = ctx.server();
    ctx.store.set_fail_reads(Some(DbErrorCode::Unavailable));

    let response = get(&server, "/api/analytics/report", &DAY).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["code"], "DB_004");

    ctx.store.set_fail_reads(None);
    let response = get(&server, "/api/analytics/report", &DAY).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_query_failure_is_not_an_empty_result() {
    let (ctx, server) = seeded();
    ctx.store.set_fail_reads(Some(DbErrorCode::QueryFailed));

    let response = get(&server, "/api/analytics/summary", &DAY).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "DB_002");
}

#[tokio::test]
async fn test_bad_parameters() {
    let (_ctx, server) = seeded();

    let response = get(&server, "/api/analytics/summary", &[]).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");

    let response = get(
        &server,
        "/api/analytics/summary",
        &[("from", "2026-10-20"), ("to", "2026-10-19")],
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_002");

    let response = get(
        &server,
        "/api/analytics/summary",
        &[("from", "2026-10-19"), ("to", "19/10/2026")],
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_001");

    // Years far outside the calendar are rejected before any bucket math.
    let response = get(
        &server,
        "/api/analytics/timeseries",
        &[("from", "2026-10-19"), ("to", "+262142-12-31")],
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_002");

    let response = get(
        &server,
        "/api/analytics/report",
        &[("from", "1970-01-01"), ("to", "9999-12-31")],
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_002");

    let mut params = DAY.to_vec();
    params.push(("granularity", "fortnight"));
    let response = get(&server, "/api/analytics/timeseries", &params).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_003");

    // Hourly buckets are limited to 31 days.
    let response = get(
        &server,
        "/api/analytics/timeseries",
        &[("from", "2026-01-01"), ("to", "2026-03-01"), ("granularity", "hour")],
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALID_002");

    let mut params = DAY.to_vec();
    params.push(("limit", "many"));
    let response = get(&server, "/api/analytics/pages", &params).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
