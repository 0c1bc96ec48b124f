//! Calendar helpers for epoch-second timestamps.
//!
//! Records carry whole seconds since the Unix epoch. Everything shown to an
//! operator is rendered in a caller-supplied time zone, normally the local one.

use std::fmt::Display;

use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Bucket key used for every calendar dimension when a timestamp is out of range.
pub const INVALID_DATE: &str = "Invalid Date";

pub const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Stored for a timestamp that cannot be read; every calendar key of it is
/// [`INVALID_DATE`].
pub const INVALID_TIMESTAMP: i64 = i64::MIN;

/// Read a stored timestamp leniently.
///
/// Whole or fractional seconds (truncated), numeric strings, and RFC 3339
/// strings are accepted. `null` is the epoch. Anything else is
/// [`INVALID_TIMESTAMP`].
pub fn timestamp_from_value(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_seconds))
            .unwrap_or(INVALID_TIMESTAMP),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_seconds))
                .or_else(|| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.timestamp())
                })
                .unwrap_or(INVALID_TIMESTAMP)
        }
        _ => INVALID_TIMESTAMP,
    }
}

fn whole_seconds(secs: f64) -> Option<i64> {
    let secs = secs.trunc();
    (secs.is_finite() && secs >= i64::MIN as f64 && secs < i64::MAX as f64).then_some(secs as i64)
}

/// Convert epoch seconds into a date-time in `tz`.
pub fn from_epoch<Tz: TimeZone>(secs: i64, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(tz))
}

/// Short calendar date, `M/D/YYYY`.
pub fn date_label<Tz>(secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match from_epoch(secs, tz) {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// Three-letter month abbreviation (`Jan`…`Dec`).
pub fn month_abbr<Tz: TimeZone>(secs: i64, tz: &Tz) -> &'static str {
    from_epoch(secs, tz)
        .map(|dt| MONTH_ABBR[dt.month0() as usize])
        .unwrap_or(INVALID_DATE)
}

/// Full month name (`January`…`December`).
pub fn month_name<Tz: TimeZone>(secs: i64, tz: &Tz) -> &'static str {
    from_epoch(secs, tz)
        .map(|dt| MONTH_NAMES[dt.month0() as usize])
        .unwrap_or(INVALID_DATE)
}

/// Four-digit calendar year as a bucket key.
pub fn year_label<Tz: TimeZone>(secs: i64, tz: &Tz) -> String {
    from_epoch(secs, tz)
        .map(|dt| dt.year().to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// ISO 8601 UTC timestamp with millisecond precision, e.g. `2024-03-05T08:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    // 2024-03-05T08:00:00Z
    const T: i64 = 1_709_625_600;

    #[test]
    fn date_label_in_utc() {
        assert_eq!(date_label(T, &Utc), "3/5/2024");
    }

    #[test]
    fn date_label_follows_zone() {
        // UTC-10 pushes 08:00Z back to the previous evening.
        let hst = FixedOffset::west_opt(10 * 3600).unwrap();
        assert_eq!(date_label(T, &hst), "3/4/2024");
    }

    #[test]
    fn month_and_year_keys() {
        assert_eq!(month_abbr(T, &Utc), "Mar");
        assert_eq!(month_name(T, &Utc), "March");
        assert_eq!(year_label(T, &Utc), "2024");
    }

    #[test]
    fn out_of_range_timestamp_is_invalid_date() {
        assert_eq!(date_label(i64::MAX, &Utc), INVALID_DATE);
        assert_eq!(month_abbr(i64::MAX, &Utc), INVALID_DATE);
        assert_eq!(year_label(i64::MAX, &Utc), INVALID_DATE);
    }

    #[test]
    fn stored_timestamp_shapes() {
        assert_eq!(timestamp_from_value(&json!(T)), T);
        assert_eq!(timestamp_from_value(&json!(1_709_625_600.9)), T);
        assert_eq!(timestamp_from_value(&json!("1709625600")), T);
        assert_eq!(timestamp_from_value(&json!(" 1709625600.5 ")), T);
        assert_eq!(timestamp_from_value(&json!("2024-03-05T08:00:00.000Z")), T);
        assert_eq!(timestamp_from_value(&Value::Null), 0);
    }

    #[test]
    fn unreadable_timestamp_is_invalid_date() {
        for value in [json!("yesterday"), json!(true), json!({"seconds": 1}), json!(1e300)] {
            let secs = timestamp_from_value(&value);
            assert_eq!(secs, INVALID_TIMESTAMP);
            assert_eq!(date_label(secs, &Utc), INVALID_DATE);
            assert_eq!(month_abbr(secs, &Utc), INVALID_DATE);
        }
    }

    #[test]
    fn iso_timestamp_has_millis_and_z() {
        let at = DateTime::from_timestamp(T, 0).unwrap();
        assert_eq!(iso_timestamp(at), "2024-03-05T08:00:00.000Z");
    }
}
