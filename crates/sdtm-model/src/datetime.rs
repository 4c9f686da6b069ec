//! ISO 8601 date helpers for timing variables (--DTC, --STDTC, --ENDTC).
//!
//! SDTM timing values are ISO 8601 strings that may carry a time part
//! (`2024-01-10T08:30`) or be partial (`2024-01`). Window arithmetic only
//! works on complete dates, so these helpers reduce a timing value to a
//! [`NaiveDate`] and return `None` for anything that is not a complete date.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

const DATE_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").ok());

/// Parses the date part of a timing value stored in a dataset.
///
/// Only the first ten characters are considered, so `2024-01-10T08:30`
/// yields 2024-01-10 while `2024-01` and free text yield `None`.
pub fn record_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let head = trimmed.get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Finds the first complete `YYYY-MM-DD` date anywhere in `value`.
///
/// Caller-supplied anchors come from free-form placeholder values
/// (`"2024-01-10 (Headache)"`, `"2024-01-10T00:00:00"`), so the date is
/// searched for rather than expected at a fixed position.
pub fn extract_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(regex) = ISO_DATE.as_ref()
        && let Some(found) = regex.find(trimmed)
    {
        return NaiveDate::parse_from_str(found.as_str(), DATE_FORMAT).ok();
    }
    record_date(trimmed)
}

/// Formats a date in ISO 8601 extended format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_date_uses_date_prefix() {
        assert_eq!(record_date("2024-01-10"), Some(date(2024, 1, 10)));
        assert_eq!(record_date("2024-01-10T08:30"), Some(date(2024, 1, 10)));
        assert_eq!(record_date(" 2024-01-10 "), Some(date(2024, 1, 10)));
    }

    #[test]
    fn record_date_rejects_partial_dates() {
        assert_eq!(record_date("2024-01"), None);
        assert_eq!(record_date("2024"), None);
        assert_eq!(record_date(""), None);
        assert_eq!(record_date("2024-02-30"), None);
        assert_eq!(record_date("UNKNOWN DATE"), None);
    }

    #[test]
    fn extract_date_searches_inside_text() {
        assert_eq!(extract_date("2024-05-10"), Some(date(2024, 5, 10)));
        assert_eq!(
            extract_date("Headache (2024-05-10 - 2024-05-12)"),
            Some(date(2024, 5, 10))
        );
        assert_eq!(extract_date("2024-05-10T00:00:00"), Some(date(2024, 5, 10)));
        assert_eq!(extract_date("ONGOING"), None);
        assert_eq!(extract_date("   "), None);
    }

    #[test]
    fn format_date_is_extended_format() {
        assert_eq!(format_date(date(2024, 3, 1)), "2024-03-01");
    }
}
