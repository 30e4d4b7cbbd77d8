//! Conf — time-origin resolution.
//!
//! Priority: explicit `--time-origin` value > date embedded in the log file
//! name > none. Rotated GC logs commonly carry their start time in the file
//! name (`gc_2013-05-16_23-05-18.log`), which is the only origin available
//! once the JVM is gone.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static FILE_NAME_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})[_T](\d{2})[.:-](\d{2})[.:-](\d{2})").unwrap()
});

static FILE_NAME_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// Resolve the epoch-ms time origin for a log file, if any can be found.
pub fn resolve_time_origin(explicit: Option<&str>, log_path: &Path) -> Result<Option<i64>> {
    if let Some(value) = explicit {
        let dt = chrono::DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("--time-origin {value:?} is not an RFC 3339 date-time"))?;
        return Ok(Some(dt.timestamp_millis()));
    }

    Ok(infer_from_file_name(log_path))
}

/// Best-effort: a date (optionally with a time) embedded in the file name,
/// interpreted as UTC.
fn infer_from_file_name(log_path: &Path) -> Option<i64> {
    let name = log_path.file_name()?.to_str()?;

    if let Some(caps) = FILE_NAME_DATETIME.captures(name) {
        let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
        let time = NaiveTime::from_hms_opt(
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
            caps[4].parse().ok()?,
        )?;
        return Some(to_epoch_ms(NaiveDateTime::new(date, time)));
    }

    if let Some(m) = FILE_NAME_DATE.find(name) {
        let date = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()?;
        return Some(to_epoch_ms(date.and_hms_opt(0, 0, 0)?));
    }

    None
}

fn to_epoch_ms(dt: NaiveDateTime) -> i64 {
    Utc.from_utc_datetime(&dt).timestamp_millis()
}
