//! Polars `AnyValue` conversions and column lookup.

use polars::prelude::{AnyValue, DataFrame};
use sdtm_model::CellValue;

/// Converts a Polars value into a result cell.
///
/// Integers stay integers and floats stay numbers; text that is empty after
/// trimming becomes [`CellValue::Null`], matching how blank SDTM cells read.
pub fn any_to_cell(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Null,
        AnyValue::Int8(v) => CellValue::Integer(i64::from(v)),
        AnyValue::Int16(v) => CellValue::Integer(i64::from(v)),
        AnyValue::Int32(v) => CellValue::Integer(i64::from(v)),
        AnyValue::Int64(v) => CellValue::Integer(v),
        AnyValue::UInt8(v) => CellValue::Integer(i64::from(v)),
        AnyValue::UInt16(v) => CellValue::Integer(i64::from(v)),
        AnyValue::UInt32(v) => CellValue::Integer(i64::from(v)),
        AnyValue::UInt64(v) => {
            i64::try_from(v).map_or(CellValue::Number(v as f64), CellValue::Integer)
        }
        AnyValue::Float32(v) => CellValue::Number(f64::from(v)),
        AnyValue::Float64(v) => CellValue::Number(v),
        AnyValue::String(s) => text_cell(s),
        AnyValue::StringOwned(s) => text_cell(s.as_str()),
        AnyValue::Boolean(b) => CellValue::text(if b { "Y" } else { "N" }),
        other => text_cell(&other.to_string()),
    }
}

fn text_cell(value: &str) -> CellValue {
    if value.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::text(value)
    }
}

/// Actual name of the column of `df` matching `name`, ignoring ASCII case.
pub fn find_column(df: &DataFrame, name: &str) -> Option<String> {
    df.get_column_names()
        .into_iter()
        .find(|candidate| candidate.as_str().eq_ignore_ascii_case(name))
        .map(|candidate| candidate.to_string())
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses a string as i64, returning None for invalid or empty strings.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    #[test]
    fn test_any_to_cell_numbers() {
        assert_eq!(any_to_cell(AnyValue::Int32(7)), CellValue::Integer(7));
        assert_eq!(any_to_cell(AnyValue::Float64(1.5)), CellValue::Number(1.5));
        assert_eq!(any_to_cell(AnyValue::Null), CellValue::Null);
    }

    #[test]
    fn test_any_to_cell_blank_text_is_null() {
        assert_eq!(any_to_cell(AnyValue::String("  ")), CellValue::Null);
        assert_eq!(
            any_to_cell(AnyValue::String("Headache")),
            CellValue::text("Headache")
        );
    }

    #[test]
    fn test_find_column_ignores_case() {
        let df = DataFrame::new(vec![
            Series::new("lbtest".into(), &["ALT", "AST"]).into(),
            Series::new("LBSTRESN".into(), &[Some(12.0), None]).into(),
        ])
        .unwrap();

        assert_eq!(find_column(&df, "LBTEST").as_deref(), Some("lbtest"));
        assert_eq!(find_column(&df, "lbstresn").as_deref(), Some("LBSTRESN"));
        assert!(find_column(&df, "LBDTC").is_none());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_i64(" -3 "), Some(-3));
        assert_eq!(parse_i64("4.5"), None);
        assert_eq!(parse_f64("4.5"), Some(4.5));
        assert_eq!(parse_f64(""), None);
    }
}
