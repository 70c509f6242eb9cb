//! Tests for health check endpoints.
//!
//! The health registry is process-global, so everything that flips backend
//! health runs inside one test.

use axum::http::StatusCode;
use integration_tests::setup::TestContext;

/// /health probes the backend and readiness follows the result.
#[tokio::test]
async fn test_health_tracks_backend_reachability() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend_connected"], true);
    assert_eq!(body["components"][0]["name"], "backend");
    assert!(body["metrics"]["queries_served"].is_u64());
    server.get("/health/ready").await.assert_status_ok();

    ctx.store.set_unreachable(true);
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["backend_connected"], false);
    assert_eq!(body["components"][0]["message"], "backend unreachable");
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    ctx.store.set_unreachable(false);
    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "healthy");
    server.get("/health/ready").await.assert_status_ok();
}

/// Liveness does not depend on the backend.
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new();
    ctx.store.set_unreachable(true);

    ctx.server().get("/health/live").await.assert_status_ok();
}

/// Unknown routes fall through to 404.
#[tokio::test]
async fn test_unknown_route() {
    let ctx = TestContext::new();
    ctx.server()
        .get("/api/analytics/unknown")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
