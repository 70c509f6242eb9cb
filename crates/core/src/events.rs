//! Interaction events tied to a visit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::environment::ElementInfo;
use crate::error::Error;
use crate::identity::SessionId;
use crate::limits::{truncate_chars, MAX_ELEMENT_ATTR_LENGTH, MAX_ELEMENT_TEXT_CHARS};
use crate::visit::VisitId;

/// Supported interaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Scroll,
}

impl EventType {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Scroll => "scroll",
        }
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(Self::Click),
            "scroll" => Ok(Self::Scroll),
            other => Err(Error::InvalidEventType(other.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event insert payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewEvent {
    pub visit_id: VisitId,
    pub session_id: SessionId,
    pub event_type: EventType,
    #[validate(length(min = 1, max = 2000))]
    pub page_path: String,
    /// Truncated to 256 characters
    #[validate(length(max = 256))]
    pub element_id: Option<String>,
    /// Truncated to 256 characters
    #[validate(length(max = 256))]
    pub element_class: Option<String>,
    /// Truncated to 100 characters
    pub element_text: Option<String>,
    pub x_position: Option<f64>,
    pub y_position: Option<f64>,
    #[validate(range(max = 100))]
    pub scroll_depth_percent: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    /// Click on a resolved interactive element.
    pub fn click(
        visit_id: VisitId,
        session_id: SessionId,
        page_path: impl Into<String>,
        element: &ElementInfo,
        x: f64,
        y: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let element_text = element
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| truncate_chars(t, MAX_ELEMENT_TEXT_CHARS));

        Self {
            visit_id,
            session_id,
            event_type: EventType::Click,
            page_path: page_path.into(),
            element_id: attribute(element.id.as_deref()),
            element_class: attribute(element.class.as_deref()),
            element_text,
            x_position: Some(x),
            y_position: Some(y),
            scroll_depth_percent: None,
            created_at,
        }
    }

    /// Scroll that reached a new maximum depth.
    pub fn scroll(
        visit_id: VisitId,
        session_id: SessionId,
        page_path: impl Into<String>,
        depth_percent: u8,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            visit_id,
            session_id,
            event_type: EventType::Scroll,
            page_path: page_path.into(),
            element_id: None,
            element_class: None,
            element_text: None,
            x_position: None,
            y_position: None,
            scroll_depth_percent: Some(depth_percent),
            created_at,
        }
    }
}

fn attribute(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| truncate_chars(v, MAX_ELEMENT_ATTR_LENGTH))
}

/// An event as read back by the query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub visit_id: String,
    pub session_id: String,
    pub event_type: EventType,
    pub page_path: String,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub scroll_depth_percent: Option<u8>,
    pub created_at: DateTime<Utc>,
}
