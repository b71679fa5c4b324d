//! Timestamps and the labels derived from them.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::{CoreError, CoreResult};

/// Valid time of a model field.
pub type Timestamp = DateTime<Utc>;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d_%H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a timestamp given as RFC 3339, a naive UTC date-time
/// (`2011-04-19 18:00:00`, `2011-04-19_18:00:00`) or epoch seconds.
pub fn parse_timestamp(raw: &str) -> CoreResult<Timestamp> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return from_epoch_seconds(secs).ok_or_else(|| CoreError::InvalidTimestamp {
            raw: raw.to_string(),
            message: "epoch seconds out of range".to_string(),
        });
    }

    Err(CoreError::InvalidTimestamp {
        raw: raw.to_string(),
        message: "expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or epoch seconds".to_string(),
    })
}

pub fn from_epoch_seconds(secs: i64) -> Option<Timestamp> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Short axis tick label, `DD/HH`.
pub fn tick_label(ts: &Timestamp) -> String {
    ts.format("%d/%H").to_string()
}

/// Plot title label, `HH:MMZ on DD/MM/YYYY`.
pub fn title_label(ts: &Timestamp) -> String {
    ts.format("%H:%MZ on %d/%m/%Y").to_string()
}
