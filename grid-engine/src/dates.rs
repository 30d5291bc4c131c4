//! FILENAME: grid-engine/src/dates.rs
//! PURPOSE: Date recognition and parsing for text cells.
//! CONTEXT: Source data carries dates as ISO strings, locale-formatted strings,
//! epoch millis, or real date values. Recognition (used by type inference) and
//! parsing (used by filters and sorting) share the same format tables.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::number::is_bare_number;
use crate::value::Value;

/// Shapes that are treated as dates without needing a successful parse.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{4}-\d{1,2}-\d{1,2}$",
        r"^\d{4}-\d{1,2}-\d{1,2}[T ]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$",
        r"^\d{4}/\d{1,2}/\d{1,2}$",
        r"^\d{1,2}/\d{1,2}/\d{4}$",
        r"^\d{1,2}\.\d{1,2}\.\d{4}$",
        r"^(?i)[a-z]{3,9}\.?\s+\d{1,2},?\s+\d{4}$",
        r"^(?i)\d{1,2}\s+[a-z]{3,9}\.?,?\s+\d{4}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid date pattern"))
    .collect()
});

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats, tried in order. Month-first wins over day-first for
/// slashed dates, matching the usual source locale.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parses date text. Offsets are normalised to UTC.
pub fn parse_date_str(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() || is_bare_number(text) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, format) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// True when text has a date shape, or parses as a date and is not a bare
/// integer/decimal.
pub fn looks_like_date(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    DATE_PATTERNS.iter().any(|p| p.is_match(text)) || parse_date_str(text).is_some()
}

/// Reads a value as a date: dates as-is, text through `parse_date_str`,
/// numbers as epoch milliseconds.
pub fn parse_value_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date_str(s),
        Value::Number(n) if n.is_finite() => {
            DateTime::from_timestamp_millis(*n as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

/// Milliseconds since the Unix epoch.
pub fn timestamp_millis(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// First instant of the day (00:00:00.000).
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last instant of the day (23:59:59.999).
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(end)
}

/// `YYYY-MM-DD` for midnight values, `YYYY-MM-DDTHH:MM:SS` otherwise.
pub fn format_date(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_common_formats() {
        assert_eq!(parse_date_str("2024-03-09"), Some(day_start(ymd(2024, 3, 9))));
        assert_eq!(parse_date_str("03/09/2024"), Some(day_start(ymd(2024, 3, 9))));
        assert_eq!(parse_date_str("25/12/2023"), Some(day_start(ymd(2023, 12, 25))));
        assert_eq!(parse_date_str("Mar 9, 2024"), Some(day_start(ymd(2024, 3, 9))));
        assert_eq!(parse_date_str("9 March 2024"), Some(day_start(ymd(2024, 3, 9))));
        assert!(parse_date_str("2024-03-09T10:30:00Z").is_some());
        assert!(parse_date_str("2024-03-09 10:30").is_some());
    }

    #[test]
    fn test_bare_numbers_are_not_dates() {
        assert_eq!(parse_date_str("20240309"), None);
        assert!(!looks_like_date("42"));
        assert!(!looks_like_date("3.14"));
        assert!(!looks_like_date("hello"));
        assert!(looks_like_date("2024-1-5"));
    }

    #[test]
    fn test_value_dates() {
        let millis = Value::Number(86_400_000.0);
        assert_eq!(parse_value_date(&millis), Some(day_start(ymd(1970, 1, 2))));
        assert_eq!(parse_value_date(&Value::Bool(true)), None);
        assert_eq!(parse_value_date(&Value::from("not a date")), None);
    }

    #[test]
    fn test_day_bounds() {
        let day = ymd(2024, 1, 31);
        assert_eq!(timestamp_millis(&day_end(day)) - timestamp_millis(&day_start(day)), 86_399_999);
    }
}
