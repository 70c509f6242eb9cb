//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::{health, metrics};
use tracing::warn;

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Full health check. Probes the backend before reporting.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    if state.query.source().check_connection().await {
        health().backend.set_healthy();
    } else {
        warn!("Backend probe failed");
        health().backend.set_unhealthy("backend unreachable");
    }

    let report = health().report();
    Json(HealthResponse {
        status: report.status.as_str().to_string(),
        backend_connected: health().backend.is_healthy(),
        components: report.components,
        metrics: metrics().snapshot(),
    })
}

/// GET /health/ready - Readiness probe (can serve queries).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
