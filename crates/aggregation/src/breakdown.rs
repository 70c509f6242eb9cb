//! Per-value counts: devices, browsers, operating systems, countries, pages.

use analytics_core::error::ValidationErrorCode;
use analytics_core::{Error, Result, VisitRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Label for rows missing a value.
pub const UNKNOWN: &str = "unknown";

/// Visit attribute to break counts down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Device,
    Browser,
    Os,
    Country,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Browser => "browser",
            Self::Os => "os",
            Self::Country => "country",
        }
    }

    fn key<'a>(&self, row: &'a VisitRow) -> &'a str {
        let value = match self {
            Self::Device => row.device_type.as_str(),
            Self::Browser => row.browser.as_str(),
            Self::Os => row.os.as_str(),
            Self::Country => row.country.as_deref().unwrap_or(UNKNOWN),
        };
        if value.is_empty() {
            UNKNOWN
        } else {
            value
        }
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "device" => Ok(Self::Device),
            "browser" => Ok(Self::Browser),
            "os" => Ok(Self::Os),
            "country" => Ok(Self::Country),
            other => Err(Error::validation_code(
                ValidationErrorCode::UnknownParameter,
                format!("unknown breakdown dimension '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStat {
    pub device_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserStat {
    pub browser: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsStat {
    pub os: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryStat {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewCount {
    /// Raw path; display labels are the consumer's concern
    pub page_path: String,
    pub views: u64,
}

/// Count per distinct value, highest first. Equal counts keep first-seen order.
fn count_by<'a>(rows: impl IntoIterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();

    for key in rows {
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect()
}

pub fn breakdown(visits: &[VisitRow], dimension: Dimension) -> Vec<BreakdownEntry> {
    count_by(visits.iter().map(|v| dimension.key(v)))
        .into_iter()
        .map(|(value, count)| BreakdownEntry { value, count })
        .collect()
}

pub fn device_stats(visits: &[VisitRow]) -> Vec<DeviceStat> {
    breakdown(visits, Dimension::Device)
        .into_iter()
        .map(|e| DeviceStat {
            device_type: e.value,
            count: e.count,
        })
        .collect()
}

pub fn browser_stats(visits: &[VisitRow]) -> Vec<BrowserStat> {
    breakdown(visits, Dimension::Browser)
        .into_iter()
        .map(|e| BrowserStat {
            browser: e.value,
            count: e.count,
        })
        .collect()
}

pub fn os_stats(visits: &[VisitRow]) -> Vec<OsStat> {
    breakdown(visits, Dimension::Os)
        .into_iter()
        .map(|e| OsStat {
            os: e.value,
            count: e.count,
        })
        .collect()
}

pub fn country_stats(visits: &[VisitRow]) -> Vec<CountryStat> {
    breakdown(visits, Dimension::Country)
        .into_iter()
        .map(|e| CountryStat {
            country: e.value,
            count: e.count,
        })
        .collect()
}

/// Most viewed paths, at most `limit`.
pub fn top_pages(visits: &[VisitRow], limit: usize) -> Vec<PageViewCount> {
    count_by(visits.iter().map(|v| v.page_path.as_str()))
        .into_iter()
        .take(limit)
        .map(|(page_path, views)| PageViewCount { page_path, views })
        .collect()
}
