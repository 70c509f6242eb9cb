//! Dashboard aggregation endpoints.

use aggregation::{AnalyticsReport, Dimension};
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::extractors::AnalyticsParams;
use crate::response::{
    ApiError, BreakdownResponse, PagesResponse, SummaryResponse, TimeSeriesResponse,
};
use crate::state::AppState;

/// GET /api/analytics/report - Full dashboard report, cached briefly.
pub async fn report_handler(
    State(state): State<AppState>,
    params: AnalyticsParams,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let report = state.report(params.report_request()).await?;
    Ok(Json(report))
}

/// GET /api/analytics/summary
pub async fn summary_handler(
    State(state): State<AppState>,
    params: AnalyticsParams,
) -> Result<Json<SummaryResponse>, ApiError> {
    let (summary, events) = tokio::try_join!(
        state.query.summary(&params.range, &params.filter),
        state.query.event_stats(&params.range, &params.filter),
    )?;

    Ok(Json(SummaryResponse {
        from: params.range.from,
        to: params.range.to,
        summary,
        events,
    }))
}

/// GET /api/analytics/timeseries
pub async fn timeseries_handler(
    State(state): State<AppState>,
    params: AnalyticsParams,
) -> Result<Json<TimeSeriesResponse>, ApiError> {
    let points = state
        .query
        .time_series(&params.range, params.granularity, &params.filter)
        .await?;

    Ok(Json(TimeSeriesResponse {
        from: params.range.from,
        to: params.range.to,
        granularity: params.granularity,
        points,
    }))
}

/// GET /api/analytics/breakdown/:dimension
pub async fn breakdown_handler(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
    params: AnalyticsParams,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let dimension: Dimension = dimension.parse()?;
    let entries = state
        .query
        .breakdown(&params.range, dimension, &params.filter)
        .await?;

    debug!(dimension = %dimension, entries = entries.len(), "Breakdown served");
    Ok(Json(BreakdownResponse { dimension, entries }))
}

/// GET /api/analytics/pages
pub async fn pages_handler(
    State(state): State<AppState>,
    params: AnalyticsParams,
) -> Result<Json<PagesResponse>, ApiError> {
    let pages = state
        .query
        .top_pages(&params.range, params.limit, &params.filter)
        .await?;
    Ok(Json(PagesResponse { pages }))
}
