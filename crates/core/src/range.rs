//! Date ranges and time-series granularity for dashboard queries.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::{MAX_RANGE_YEAR, MIN_RANGE_YEAR};

/// Inclusive calendar date range, timezone-naive.
///
/// Timestamps are compared in UTC: a range `[from, to]` covers
/// `from 00:00:00` up to but excluding `to + 1 day 00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `from > to` and years outside
    /// `MIN_RANGE_YEAR..=MAX_RANGE_YEAR`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        for date in [from, to] {
            if !(MIN_RANGE_YEAR..=MAX_RANGE_YEAR).contains(&date.year()) {
                return Err(Error::validation_code(
                    ValidationErrorCode::InvalidRange,
                    format!(
                        "date {} is outside the years {}..={}",
                        date, MIN_RANGE_YEAR, MAX_RANGE_YEAR
                    ),
                ));
            }
        }
        if from > to {
            return Err(Error::validation_code(
                ValidationErrorCode::InvalidRange,
                format!("range start {} is after range end {}", from, to),
            ));
        }
        Ok(Self { from, to })
    }

    /// Parses `YYYY-MM-DD` bounds. Malformed dates are `VALID_001`.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
                Error::validation_code(
                    ValidationErrorCode::InvalidFormat,
                    format!("invalid date '{}': {}", s, e),
                )
            })
        };
        Self::new(parse(from)?, parse(to)?)
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// First instant covered by the range.
    pub fn start(&self) -> NaiveDateTime {
        self.from.and_time(NaiveTime::MIN)
    }

    /// First instant after the range.
    pub fn end_exclusive(&self) -> NaiveDateTime {
        self.to
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Number of calendar days covered.
    pub fn num_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Whether a UTC timestamp falls inside the range.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let naive = ts.naive_utc();
        naive >= self.start() && naive < self.end_exclusive()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

/// Time-series bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Start of the bucket containing `at`.
    pub fn bucket_start(&self, at: NaiveDateTime) -> NaiveDateTime {
        let midnight = at.date().and_time(NaiveTime::MIN);
        match self {
            Self::Hour => midnight + Duration::hours(i64::from(at.hour())),
            Self::Day => midnight,
            Self::Week => midnight
                .checked_sub_signed(Duration::days(i64::from(at.weekday().num_days_from_monday())))
                .unwrap_or(NaiveDateTime::MIN),
            Self::Month => midnight
                .checked_sub_signed(Duration::days(i64::from(at.day0())))
                .unwrap_or(NaiveDateTime::MIN),
        }
    }

    /// Start of the bucket following the one starting at `start`.
    pub fn next_bucket(&self, start: NaiveDateTime) -> NaiveDateTime {
        let next = match self {
            Self::Hour => start.checked_add_signed(Duration::hours(1)),
            Self::Day => start.checked_add_signed(Duration::days(1)),
            Self::Week => start.checked_add_signed(Duration::weeks(1)),
            Self::Month => start.checked_add_months(Months::new(1)),
        };
        next.unwrap_or(NaiveDateTime::MAX)
    }

    /// Display key for a bucket.
    ///
    /// `HH:mm` for hours, `MM/DD` for days, ISO week (`2026-W42`) for weeks,
    /// month abbreviation (`Oct`) for months.
    pub fn label(&self, start: NaiveDateTime) -> String {
        match self {
            Self::Hour => start.format("%H:%M").to_string(),
            Self::Day => start.format("%m/%d").to_string(),
            Self::Week => {
                let week = start.date().iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Month => start.format("%b").to_string(),
        }
    }

    /// Bucket starts covering the whole range, in order, without gaps.
    pub fn bucket_starts(&self, range: &DateRange) -> Vec<NaiveDateTime> {
        let end = range.end_exclusive();
        let mut starts = Vec::new();
        let mut cursor = self.bucket_start(range.start());
        while cursor < end {
            starts.push(cursor);
            cursor = self.next_bucket(cursor);
        }
        starts
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(Error::validation_code(
                ValidationErrorCode::UnknownParameter,
                format!("unknown granularity '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
