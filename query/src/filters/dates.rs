//! Relative date resolution
//!
//! Resolves symbolic tokens (`today`, `last_30_days`, ...) against a
//! reference instant into half-open `[start, end)` intervals. Calendar
//! buckets (days, weeks, months) align to UTC midnight with weeks starting
//! Monday; the `last_N_days` tokens are rolling windows ending at the
//! reference instant itself.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

/// Closed set of relative date tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDateToken {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
}

impl RelativeDateToken {
    pub const ALL: &'static [RelativeDateToken] = &[
        Self::Today,
        Self::Yesterday,
        Self::ThisWeek,
        Self::LastWeek,
        Self::ThisMonth,
        Self::LastMonth,
        Self::Last7Days,
        Self::Last30Days,
        Self::Last90Days,
    ];

    /// Wire name of the token (matches the serde rename)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this_week",
            Self::LastWeek => "last_week",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::Last90Days => "last_90_days",
        }
    }
}

impl FromStr for RelativeDateToken {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|token| token.as_str() == s)
            .ok_or_else(|| QueryError::UnsupportedToken(s.to_string()))
    }
}

/// Half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// UTC midnight of the instant's calendar day
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// UTC midnight of the most recent Monday (ISO week start)
fn start_of_week(instant: DateTime<Utc>) -> DateTime<Utc> {
    let days = i64::from(instant.date_naive().weekday().num_days_from_monday());
    start_of_day(instant) - Duration::days(days)
}

/// UTC midnight of the first day of the instant's month
fn start_of_month(instant: DateTime<Utc>) -> DateTime<Utc> {
    let date = instant.date_naive();
    // day 1 is valid for every month
    let first = date.with_day(1).unwrap_or(date);
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Resolve a token against a reference instant into `[start, end)`
pub fn resolve(token: RelativeDateToken, now: DateTime<Utc>) -> DateRange {
    let today = start_of_day(now);
    match token {
        RelativeDateToken::Today => DateRange {
            start: today,
            end: today + Duration::days(1),
        },
        RelativeDateToken::Yesterday => DateRange {
            start: today - Duration::days(1),
            end: today,
        },
        RelativeDateToken::ThisWeek => {
            let start = start_of_week(now);
            DateRange {
                start,
                end: start + Duration::days(7),
            }
        }
        RelativeDateToken::LastWeek => {
            let end = start_of_week(now);
            DateRange {
                start: end - Duration::days(7),
                end,
            }
        }
        RelativeDateToken::ThisMonth => {
            let start = start_of_month(now);
            // +32 days always lands in the following month from a day-1 midnight
            DateRange {
                start,
                end: start_of_month(start + Duration::days(32)),
            }
        }
        RelativeDateToken::LastMonth => {
            let end = start_of_month(now);
            DateRange {
                start: start_of_month(end - Duration::days(1)),
                end,
            }
        }
        RelativeDateToken::Last7Days => rolling(now, 7),
        RelativeDateToken::Last30Days => rolling(now, 30),
        RelativeDateToken::Last90Days => rolling(now, 90),
    }
}

fn rolling(now: DateTime<Utc>, days: i64) -> DateRange {
    DateRange {
        start: now - Duration::days(days),
        end: now,
    }
}

/// Parse a date operator value: RFC 3339 timestamp or plain `YYYY-MM-DD`
pub fn parse_date_value(value: &Value) -> Result<DateTime<Utc>, QueryError> {
    let Some(s) = value.as_str() else {
        return Err(QueryError::InvalidDate(value.to_string()));
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(QueryError::InvalidDate(s.to_string()))
}

/// Serialize an instant into predicate values (RFC 3339, microsecond precision)
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
