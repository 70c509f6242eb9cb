//! Request extractors.

use aggregation::ReportRequest;
use analytics_core::limits::DEFAULT_TOP_PAGES_LIMIT;
use analytics_core::{DateRange, EventType, Granularity, RowFilter};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::response::ApiError;

/// Raw query string accepted by the analytics routes.
#[derive(Debug, Default, Deserialize)]
pub struct RawParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub granularity: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<String>,
    pub event_type: Option<String>,
}

/// Validated analytics parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsParams {
    pub range: DateRange,
    pub granularity: Granularity,
    pub limit: usize,
    pub filter: RowFilter,
}

impl AnalyticsParams {
    pub fn parse(raw: RawParams) -> Result<Self, ApiError> {
        let (from, to) = match (raw.from.as_deref(), raw.to.as_deref()) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(ApiError::bad_request(
                    "query parameters 'from' and 'to' are required (YYYY-MM-DD)",
                ))
            }
        };
        let range = DateRange::parse(from, to)?;

        let granularity = match raw.granularity.as_deref() {
            Some(g) => g.parse::<Granularity>()?,
            None => Granularity::Day,
        };

        let mut filter = match raw.page {
            Some(page) if !page.is_empty() => RowFilter::page(page),
            _ => RowFilter::none(),
        };
        if let Some(event_type) = raw.event_type.as_deref() {
            filter = filter.with_event_type(event_type.parse::<EventType>()?);
        }

        Ok(Self {
            range,
            granularity,
            limit: raw.limit.unwrap_or(DEFAULT_TOP_PAGES_LIMIT),
            filter,
        })
    }

    pub fn report_request(&self) -> ReportRequest {
        ReportRequest::new(self.range, self.granularity)
            .with_limit(self.limit)
            .with_filter(self.filter.clone())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AnalyticsParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Self::parse(raw)
    }
}
