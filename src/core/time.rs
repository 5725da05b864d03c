//! Shared timestamp helpers for reports and staleness checks.

use crate::core::error::DocgateError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub const TODAY_ENV: &str = "DOCGATE_TODAY";

/// Current UTC time as RFC 3339 with a `Z` suffix (e.g. `2026-10-16T08:30:00Z`).
pub fn now_utc_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The date staleness is measured against. `DOCGATE_TODAY=YYYY-MM-DD` pins it
/// for reproducible runs.
pub fn today() -> Result<NaiveDate, DocgateError> {
    match std::env::var(TODAY_ENV) {
        Ok(raw) => parse_date(&raw).ok_or_else(|| {
            DocgateError::ConfigError(format!(
                "invalid {TODAY_ENV} `{raw}` (expected YYYY-MM-DD)"
            ))
        }),
        Err(_) => Ok(Utc::now().date_naive()),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// RFC 3339, or an ISO 8601 date-time without an offset, which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc()),
    }
}

/// Whole days from `date` to `today`; negative for future dates.
pub fn age_in_days(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}
