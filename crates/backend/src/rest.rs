//! HTTPS row API client.

use analytics_core::{
    DateRange, DbErrorCode, Error, EventRow, NewEvent, NewVisit, Result, RowFilter, RowSource, VisitId,
    VisitRow, VisitStore,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::RestConfig;
use crate::status::{from_status, from_transport, Operation};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Row returned by an insert with `return=representation`.
#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: serde_json::Value,
}

/// Client for the `visits` and `events` tables.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: RestConfig,
}

impl RestClient {
    pub fn new(config: RestConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(auth_headers(&config.api_key)?)
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    async fn send(&self, op: Operation, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| from_transport(op, &e))?;

        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(from_status(op, status, &body))
    }

    async fn json<T: DeserializeOwned>(&self, op: Operation, response: reqwest::Response) -> Result<T> {
        response.json().await.map_err(|e| {
            Error::database(op.fallback(), format!("Invalid backend response: {}", e))
        })
    }

    /// Fetch every row in the range, page by page.
    ///
    /// Row APIs cap responses on their side (PostgREST `max-rows`), so a
    /// short page proves nothing. The exact total from `Content-Range`
    /// decides when the select is complete; an empty page before that, or a
    /// total above `max_rows`, fails the query instead of undercounting.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        time_column: &str,
        range: &DateRange,
        filters: Vec<(&'static str, String)>,
    ) -> Result<Vec<T>> {
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            (time_column, format!("gte.{}", range.start().format(TIMESTAMP_FORMAT))),
            (time_column, format!("lt.{}", range.end_exclusive().format(TIMESTAMP_FORMAT))),
            ("order", format!("{}.asc,id.asc", time_column)),
            ("limit", self.config.page_size.max(1).to_string()),
        ];
        params.extend(filters);

        let mut rows: Vec<T> = Vec::new();
        let mut pages = 0usize;
        loop {
            let request = self
                .http
                .get(self.config.table_url(table))
                .header("Prefer", "count=exact")
                .query(&params)
                .query(&[("offset", rows.len())]);
            let response = self.send(Operation::Read, request).await?;
            let total = content_range_total(response.headers());
            let page: Vec<T> = self.json(Operation::Read, response).await?;
            let fetched = page.len();
            rows.extend(page);
            pages += 1;

            let total = match total {
                Some(total) => total,
                // Without a count, only an empty page ends the select.
                None if fetched == 0 => break,
                None => {
                    self.check_row_limit(table, rows.len())?;
                    continue;
                }
            };
            self.check_row_limit(table, total)?;
            if rows.len() >= total {
                break;
            }
            if fetched == 0 {
                warn!(table, rows = rows.len(), total, "Row API stopped returning rows");
                return Err(Error::database(
                    DbErrorCode::QueryFailed,
                    format!("{} select returned {} of {} rows", table, rows.len(), total),
                ));
            }
        }

        debug!(table, range = %range, rows = rows.len(), pages, "Rows selected");
        Ok(rows)
    }

    fn check_row_limit(&self, table: &str, rows: usize) -> Result<()> {
        if rows > self.config.max_rows {
            warn!(table, rows, max_rows = self.config.max_rows, "Select exceeds the row limit");
            return Err(Error::database(
                DbErrorCode::QueryFailed,
                format!(
                    "{} select matches {} rows, more than the limit of {}",
                    table, rows, self.config.max_rows
                ),
            ));
        }
        Ok(())
    }
}

/// Total from a `Content-Range: 0-999/1500` header; `None` when absent or `*`.
fn content_range_total(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .trim()
        .parse()
        .ok()
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if api_key.is_empty() {
        return Ok(headers);
    }
    let invalid = |_| Error::internal("API key is not a valid header value");
    headers.insert("apikey", HeaderValue::from_str(api_key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(invalid)?,
    );
    Ok(headers)
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Render an id the backend returned, whether numeric or textual.
fn id_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl VisitStore for RestClient {
    async fn insert_visit(&self, visit: &NewVisit) -> Result<VisitId> {
        let request = self
            .http
            .post(self.config.table_url(&self.config.visits_table))
            .header("Prefer", "return=representation")
            .json(visit);

        let response = self.send(Operation::Write, request).await?;
        let rows: Vec<InsertedRow> = self.json(Operation::Write, response).await?;

        let id = rows
            .into_iter()
            .next()
            .and_then(|row| id_string(row.id))
            .ok_or_else(|| {
                Error::database(Operation::Write.fallback(), "Insert returned no visit id")
            })?;

        debug!(visit_id = %id, page_path = %visit.page_path, "Visit inserted");
        Ok(VisitId::new(id))
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<()> {
        let request = self
            .http
            .post(self.config.table_url(&self.config.events_table))
            .header("Prefer", "return=minimal")
            .json(event);

        self.send(Operation::Write, request).await?;
        Ok(())
    }
}

#[async_trait]
impl RowSource for RestClient {
    async fn query_visits(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<VisitRow>> {
        let mut filters = Vec::new();
        if let Some(path) = &filter.page_path {
            filters.push(("page_path", eq(path)));
        }
        self.select(&self.config.visits_table, "entered_at", range, filters)
            .await
    }

    async fn query_events(&self, range: &DateRange, filter: &RowFilter) -> Result<Vec<EventRow>> {
        let mut filters = Vec::new();
        if let Some(path) = &filter.page_path {
            filters.push(("page_path", eq(path)));
        }
        if let Some(event_type) = filter.event_type {
            filters.push(("event_type", eq(event_type.as_str())));
        }
        self.select(&self.config.events_table, "created_at", range, filters)
            .await
    }

    async fn check_connection(&self) -> bool {
        let request = self
            .http
            .get(self.config.table_url(&self.config.visits_table))
            .query(&[("select", "id"), ("limit", "1")]);

        match self.send(Operation::Read, request).await {
            Ok(_) => {
                debug!(base_url = %self.config.base_url, "Backend connection healthy");
                true
            }
            Err(e) => {
                error!(base_url = %self.config.base_url, error = %e, "Backend health check failed");
                false
            }
        }
    }
}
