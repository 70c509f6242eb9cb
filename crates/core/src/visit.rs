//! Visit records: creation payload, exit patch and read-side rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::device::{DeviceProfile, DeviceType};
use crate::identity::SessionId;
use crate::limits::BOUNCE_THRESHOLD_SECS;

/// Identifier assigned by the persistence collaborator on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitId(String);

impl VisitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UTM attribution parsed from the landing URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utm {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

/// Path and attribution extracted from a page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub path: String,
    pub utm: Utm,
}

impl PageLocation {
    /// Parse an absolute or root-relative URL. Unparseable input maps to `/`.
    pub fn parse(raw: &str) -> Self {
        let parsed = url::Url::parse(raw).or_else(|_| {
            url::Url::parse("http://localhost")
                .and_then(|base| base.join(raw))
        });

        let Ok(url) = parsed else {
            return Self {
                path: "/".to_string(),
                utm: Utm::default(),
            };
        };

        let mut utm = Utm::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "utm_source" => &mut utm.source,
                "utm_medium" => &mut utm.medium,
                "utm_campaign" => &mut utm.campaign,
                "utm_term" => &mut utm.term,
                "utm_content" => &mut utm.content,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self {
            path: url.path().to_string(),
            utm,
        }
    }
}

/// Creation write for a visit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVisit {
    pub session_id: SessionId,
    #[validate(length(min = 1, max = 2000))]
    pub page_path: String,
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    #[validate(length(max = 256))]
    pub utm_source: Option<String>,
    #[validate(length(max = 256))]
    pub utm_medium: Option<String>,
    #[validate(length(max = 256))]
    pub utm_campaign: Option<String>,
    #[validate(length(max = 256))]
    pub utm_term: Option<String>,
    #[validate(length(max = 256))]
    pub utm_content: Option<String>,
    pub device_type: DeviceType,
    #[validate(length(max = 128))]
    pub browser: String,
    #[validate(length(max = 128))]
    pub os: String,
    #[validate(length(max = 64))]
    pub os_version: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub entered_at: DateTime<Utc>,
}

impl NewVisit {
    /// Assemble the creation record for the current page.
    pub fn new(
        session_id: SessionId,
        location: PageLocation,
        referrer: Option<String>,
        profile: DeviceProfile,
        entered_at: DateTime<Utc>,
    ) -> Self {
        let PageLocation { path, utm } = location;
        Self {
            session_id,
            page_path: path,
            referrer: referrer.filter(|r| !r.is_empty()),
            utm_source: utm.source,
            utm_medium: utm.medium,
            utm_campaign: utm.campaign,
            utm_term: utm.term,
            utm_content: utm.content,
            device_type: profile.device_type,
            browser: profile.browser,
            os: profile.os,
            os_version: profile.os_version,
            screen_width: profile.screen_width,
            screen_height: profile.screen_height,
            entered_at,
        }
    }
}

/// Exit fields written at most once, at unload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitExit {
    pub exited_at: DateTime<Utc>,
    pub time_on_page_seconds: i64,
    pub is_bounce: bool,
}

impl VisitExit {
    /// Compute exit fields using the standard bounce threshold.
    pub fn compute(entered_at: DateTime<Utc>, exited_at: DateTime<Utc>) -> Self {
        Self::with_threshold(entered_at, exited_at, BOUNCE_THRESHOLD_SECS)
    }

    /// Compute exit fields; a visit bounces when strictly shorter than the threshold.
    pub fn with_threshold(entered_at: DateTime<Utc>, exited_at: DateTime<Utc>, threshold_secs: i64) -> Self {
        let time_on_page_seconds = (exited_at - entered_at).num_seconds().max(0);
        Self {
            exited_at,
            time_on_page_seconds,
            is_bounce: time_on_page_seconds < threshold_secs,
        }
    }
}

/// A visit as read back by the query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRow {
    pub id: String,
    pub session_id: String,
    pub page_path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    #[serde(default)]
    pub os_version: Option<String>,
    /// Set by the collaborator (geo lookup), never by the client
    #[serde(default)]
    pub country: Option<String>,
    pub entered_at: DateTime<Utc>,
    #[serde(default)]
    pub exited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_on_page_seconds: Option<i64>,
    #[serde(default)]
    pub is_bounce: Option<bool>,
}

impl VisitRow {
    /// Whether the exit write landed for this visit.
    pub fn has_exit(&self) -> bool {
        self.time_on_page_seconds.is_some()
    }

    /// Bounce flag for exited visits, derived from the duration if the flag is missing.
    pub fn bounced(&self) -> Option<bool> {
        match (self.is_bounce, self.time_on_page_seconds) {
            (Some(flag), Some(_)) => Some(flag),
            (None, Some(secs)) => Some(secs < BOUNCE_THRESHOLD_SECS),
            _ => None,
        }
    }
}
