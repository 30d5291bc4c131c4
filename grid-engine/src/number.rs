//! FILENAME: grid-engine/src/number.rs
//! PURPOSE: Number parsing and formatting for loosely typed cells.

use once_cell::sync::Lazy;
use regex::Regex;

/// A plain integer or decimal with an optional sign and nothing else.
static BARE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("valid bare number pattern"));

/// Parses text as a finite number after stripping thousands separators.
/// Blank text, `inf` and `NaN` are not numbers.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// True when the text is a bare integer or decimal ("42", "-3.5", ".5").
pub fn is_bare_number(text: &str) -> bool {
    BARE_NUMBER.is_match(text.trim())
}

/// Formats a number without unnecessary decimal places.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_number("-7"), Some(-7.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("12abc"), None);
    }

    #[test]
    fn test_bare_number() {
        assert!(is_bare_number("42"));
        assert!(is_bare_number("-3.5"));
        assert!(is_bare_number(".5"));
        assert!(!is_bare_number("2024-01-01"));
        assert!(!is_bare_number("1,000"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
    }
}
