//! ClickHouse round trip.
//!
//! Requires Docker (`ANALYTICS_TEST_DOCKER=1`) or a running server
//! (`ANALYTICS_TEST_CLICKHOUSE_URL`); skipped otherwise.

use analytics_core::{
    DateRange, EventType, NewEvent, RowFilter, RowSource, VisitExit, VisitStore,
};
use chrono::Utc;
use clickhouse_client::check_connection;
use integration_tests::{
    fixtures,
    setup::{clickhouse_enabled, ClickHouseContext},
};
use std::time::Duration;

#[tokio::test]
async fn test_visit_event_and_exit_round_trip() {
    if !clickhouse_enabled() {
        eprintln!("skipping: set ANALYTICS_TEST_DOCKER=1 or ANALYTICS_TEST_CLICKHOUSE_URL");
        return;
    }
    let ctx = ClickHouseContext::new().await;
    assert!(check_connection(&ctx.client).await);

    // Today, so concurrent runs against a shared server don't collide with fixtures.
    let entered_at = Utc::now();
    let range = DateRange::day(entered_at.date_naive());
    let path = format!("/ch-{}", uuid::Uuid::new_v4());
    let filter = RowFilter::page(path.clone());

    let visit = fixtures::new_visit(&path, entered_at);
    let visit_id = ctx.client.insert_visit(&visit).await.unwrap();

    ctx.client
        .insert_event(&NewEvent::scroll(
            visit_id.clone(),
            visit.session_id.clone(),
            path.clone(),
            75,
            entered_at,
        ))
        .await
        .unwrap();

    let exit = VisitExit::compute(entered_at, entered_at + chrono::Duration::seconds(7));
    ctx.client.update_exit(&visit_id, &exit).await.unwrap();

    // Mutations apply in the background.
    let mut rows = Vec::new();
    for _ in 0..50 {
        rows = ctx.client.query_visits(&range, &filter).await.unwrap();
        if rows.first().is_some_and(|r| r.has_exit()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, visit_id.as_str());
    assert_eq!(row.device_type, "desktop");
    assert_eq!(row.entered_at.timestamp_millis(), entered_at.timestamp_millis());
    assert_eq!(row.time_on_page_seconds, Some(7));
    assert_eq!(row.is_bounce, Some(true));

    let events = ctx
        .client
        .query_events(&range, &filter.clone().with_event_type(EventType::Scroll))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].visit_id, visit_id.as_str());
    assert_eq!(events[0].scroll_depth_percent, Some(75));
}
