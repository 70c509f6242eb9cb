//! API routes.

pub mod analytics;
pub mod health;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analytics/report", get(analytics::report_handler))
        .route("/api/analytics/summary", get(analytics::summary_handler))
        .route("/api/analytics/timeseries", get(analytics::timeseries_handler))
        .route(
            "/api/analytics/breakdown/:dimension",
            get(analytics::breakdown_handler),
        )
        .route("/api/analytics/pages", get(analytics::pages_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
