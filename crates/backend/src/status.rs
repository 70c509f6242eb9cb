//! Translation of transport and HTTP failures into coded errors.

use analytics_core::{DbErrorCode, Error};
use reqwest::StatusCode;

/// Postgres unique violation as reported in PostgREST error bodies.
const UNIQUE_VIOLATION: &str = "23505";

/// Which side of the API failed; picks the fallback code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    Read,
}

impl Operation {
    /// Code used when nothing more specific applies.
    pub fn fallback(self) -> DbErrorCode {
        match self {
            Self::Write => DbErrorCode::StoreFailed,
            Self::Read => DbErrorCode::QueryFailed,
        }
    }
}

/// Map a non-success response.
pub fn from_status(op: Operation, status: StatusCode, body: &str) -> Error {
    let code = if status == StatusCode::CONFLICT || body.contains(UNIQUE_VIOLATION) {
        DbErrorCode::Conflict
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        DbErrorCode::Timeout
    } else if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::BAD_GATEWAY {
        DbErrorCode::Unavailable
    } else {
        op.fallback()
    };

    let body = body.trim();
    let message = if body.is_empty() {
        format!("backend returned {}", status)
    } else {
        format!("backend returned {}: {}", status, body)
    };
    Error::database(code, message)
}

/// Map a failure to get any response at all.
pub fn from_transport(op: Operation, err: &reqwest::Error) -> Error {
    let code = if err.is_timeout() {
        DbErrorCode::Timeout
    } else if err.is_connect() {
        DbErrorCode::Unavailable
    } else {
        op.fallback()
    };
    Error::database(code, format!("backend request failed: {}", err))
}
