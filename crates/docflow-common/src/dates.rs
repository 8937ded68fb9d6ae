//! Date and timestamp parsing
//!
//! Two flavours of input reach the connectors:
//!
//! - **Window bounds** supplied by the user (`oldest`, `latest`), validated
//!   against [`DATE_FORMATS`], RFC 3339 or epoch seconds.
//! - **Source timestamps** found inside fetched content (Slack `ts` values,
//!   Drive `createdTime`), which are epoch seconds or RFC 3339.
//!
//! Naive inputs (no offset) are interpreted as UTC.

use crate::error::{DocflowError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Accepted formats for user supplied window bounds
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%z"];

/// Parse a user supplied date argument, returning `None` when no format matches
pub fn parse_date_arg(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMATS[0]) {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, DATE_FORMATS[1]) {
        return Some(Utc.from_utc_datetime(&dt));
    }

    if let Ok(dt) = DateTime::parse_from_str(value, DATE_FORMATS[2]) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_epoch_seconds(value)
}

/// Validate a date argument, failing with `InvalidConfiguration`
pub fn validate_date_arg(field: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_date_arg(value).ok_or_else(|| {
        DocflowError::invalid_config(format!(
            "{field} '{value}' does not match any accepted format ({}, RFC 3339 or epoch seconds)",
            DATE_FORMATS.join(", ")
        ))
    })
}

/// Parse a timestamp found in source content
pub fn parse_source_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(dt) = parse_epoch_seconds(raw) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    Err(DocflowError::parse(format!("Unrecognized source timestamp: '{raw}'")))
}

/// Parse `"1512085950.000216"` style epoch seconds without going through f64
pub fn parse_epoch_seconds(raw: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = match raw.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (raw, ""),
    };

    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let secs: i64 = secs.parse().ok()?;
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse().ok()?
    };

    DateTime::from_timestamp(secs, nanos)
}

/// Render a timestamp the way Slack expects `oldest`/`latest` parameters
pub fn to_epoch_string(dt: &DateTime<Utc>) -> String {
    format!("{}.{:06}", dt.timestamp(), dt.timestamp_subsec_micros())
}
