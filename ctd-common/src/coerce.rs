//! Field coercion helpers for spreadsheet cells
//!
//! Spreadsheet cells arrive as free-form strings. These helpers convert them
//! to typed values while tolerating blank, missing, and malformed input:
//! absence (`None`, or the empty string for text) is the uniform failure
//! signal, never a panic or an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Canonical timestamp format used throughout the store
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted datetime input formats, tried in order
const DATETIME_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Accepted date-only input formats, tried after the datetime formats
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Convert a cell to an integer: floor of the parsed float.
///
/// Returns `None` for a missing cell, a blank cell, or a parse failure.
pub fn parse_int(value: Option<&str>) -> Option<i64> {
    let v = value.map(str::trim).filter(|s| !s.is_empty())?;
    let f = v.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Some(f.floor() as i64)
}

/// Convert a cell to a float.
///
/// Returns `None` for a missing cell, a blank cell, or a parse failure.
pub fn parse_float(value: Option<&str>) -> Option<f64> {
    let v = value.map(str::trim).filter(|s| !s.is_empty())?;
    v.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Convert a cell to a trimmed string; the empty string when absent.
pub fn parse_string(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or("").to_string()
}

/// Convert a percentage cell to a float: `"67%"` → `67.0`, `"67"` → `67.0`.
///
/// One trailing `%` is stripped before parsing. Returns `None` for a missing
/// cell, a blank cell, or a parse failure.
pub fn parse_percentage(value: Option<&str>) -> Option<f64> {
    let v = value.map(str::trim).filter(|s| !s.is_empty())?;
    let v = v.strip_suffix('%').map(str::trim).unwrap_or(v);
    v.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Normalize a timestamp cell to the canonical `YYYY-MM-DD HH:MM:SS` form.
///
/// Tries RFC 3339, then the datetime formats, then date-only formats
/// (midnight). If nothing matches, the trimmed original string is returned
/// verbatim so the raw value survives into the store. Returns `None` only
/// when the cell is missing or blank.
pub fn parse_timestamp(value: Option<&str>) -> Option<String> {
    let v = value.map(str::trim).filter(|s| !s.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.naive_local().format(TIMESTAMP_FORMAT).to_string());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Some(dt.format(TIMESTAMP_FORMAT).to_string());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(v, fmt) {
            return Some(d.and_time(NaiveTime::MIN).format(TIMESTAMP_FORMAT).to_string());
        }
    }

    Some(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_plain() {
        assert_eq!(parse_int(Some("42")), Some(42));
        assert_eq!(parse_int(Some(" 42 ")), Some(42));
    }

    #[test]
    fn test_parse_int_floors_floats() {
        assert_eq!(parse_int(Some("42.9")), Some(42));
        assert_eq!(parse_int(Some("-2.7")), Some(-3));
    }

    #[test]
    fn test_parse_int_malformed() {
        assert_eq!(parse_int(Some("abc")), None);
        assert_eq!(parse_int(Some("")), None);
        assert_eq!(parse_int(Some("   ")), None);
        assert_eq!(parse_int(None), None);
        assert_eq!(parse_int(Some("NaN")), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(Some("3.5")), Some(3.5));
        assert_eq!(parse_float(Some("7")), Some(7.0));
        assert_eq!(parse_float(Some("x")), None);
        assert_eq!(parse_float(None), None);
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(parse_string(Some("  C1  ")), "C1");
        assert_eq!(parse_string(Some("")), "");
        assert_eq!(parse_string(None), "");
    }

    #[test]
    fn test_parse_percentage_with_sign() {
        assert_eq!(parse_percentage(Some("67%")), Some(67.0));
        assert_eq!(parse_percentage(Some("67 %")), Some(67.0));
    }

    #[test]
    fn test_parse_percentage_without_sign() {
        assert_eq!(parse_percentage(Some("67")), Some(67.0));
        assert_eq!(parse_percentage(Some("67.5")), Some(67.5));
    }

    #[test]
    fn test_parse_percentage_malformed() {
        assert_eq!(parse_percentage(Some("abc")), None);
        assert_eq!(parse_percentage(Some("%")), None);
        assert_eq!(parse_percentage(Some("")), None);
        assert_eq!(parse_percentage(None), None);
    }

    #[test]
    fn test_parse_timestamp_canonical_is_fixed_point() {
        let canonical = "2024-01-14 13:45:12";
        assert_eq!(parse_timestamp(Some(canonical)), Some(canonical.to_string()));
    }

    #[test]
    fn test_parse_timestamp_us_format() {
        assert_eq!(
            parse_timestamp(Some("1/14/2024 13:45:12")),
            Some("2024-01-14 13:45:12".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        assert_eq!(
            parse_timestamp(Some("2024-01-14")),
            Some("2024-01-14 00:00:00".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        assert_eq!(
            parse_timestamp(Some("2024-01-14T13:45:12+02:00")),
            Some("2024-01-14 13:45:12".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_unparseable_preserved_verbatim() {
        assert_eq!(
            parse_timestamp(Some(" sometime last week ")),
            Some("sometime last week".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_blank() {
        assert_eq!(parse_timestamp(Some("")), None);
        assert_eq!(parse_timestamp(Some("   ")), None);
        assert_eq!(parse_timestamp(None), None);
    }
}
