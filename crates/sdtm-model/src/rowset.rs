//! Tabular results returned by a dataset read.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A single cell value.
///
/// Serializes as the bare JSON value (`null`, number, or string).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// True for nulls and whitespace-only text, the SQL `NULLIF(x, '') IS NULL` test.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(value) => value.trim().is_empty(),
            CellValue::Integer(_) | CellValue::Number(_) => false,
        }
    }

    /// Text form used for comparisons and display. Nulls render empty.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Integer(value) => value.to_string(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Text(value) => value.clone(),
        }
    }

    /// Numeric view of the cell, parsing text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(value) => Some(*value as f64),
            CellValue::Number(value) => Some(*value),
            CellValue::Text(value) => value.trim().parse::<f64>().ok(),
        }
    }

    /// Ordering used for ORDER BY and MIN/MAX: nulls first, numbers
    /// numerically, everything else by text.
    pub fn sql_cmp(&self, other: &CellValue) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        if self.is_numeric() && other.is_numeric() {
            let left = self.as_f64().unwrap_or_default();
            let right = other.as_f64().unwrap_or_default();
            return left.partial_cmp(&right).unwrap_or(Ordering::Equal);
        }
        self.as_text().cmp(&other.as_text())
    }

    fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Number(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Formats a floating-point number without trailing zeros.
fn format_number(value: f64) -> String {
    let s = format!("{value}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Rows with their column names, as returned by a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in the first row, if both exist.
    pub fn first_value(&self, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().position(|name| name == column)?;
        self.rows.first().and_then(|row| row.get(idx))
    }

    /// All values of `column`, in row order.
    pub fn column_values(&self, column: &str) -> Vec<&CellValue> {
        let Some(idx) = self.columns.iter().position(|name| name == column) else {
            return Vec::new();
        };
        self.rows.iter().filter_map(|row| row.get(idx)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::text("  ").is_blank());
        assert!(!CellValue::text("x").is_blank());
        assert!(!CellValue::Integer(0).is_blank());
    }

    #[test]
    fn sql_ordering_puts_nulls_first_and_compares_numbers() {
        assert_eq!(
            CellValue::Null.sql_cmp(&CellValue::text("a")),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Integer(10).sql_cmp(&CellValue::Number(9.5)),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::text("2024-01-02").sql_cmp(&CellValue::text("2024-01-10")),
            Ordering::Less
        );
    }

    #[test]
    fn numbers_render_without_trailing_zeros() {
        assert_eq!(CellValue::Number(3.50).as_text(), "3.5");
        assert_eq!(CellValue::Number(4.0).as_text(), "4");
        assert_eq!(CellValue::Integer(12).as_text(), "12");
    }

    #[test]
    fn cells_serialize_as_bare_values() {
        let row = vec![
            CellValue::Null,
            CellValue::Integer(3),
            CellValue::text("Headache"),
        ];
        let json = serde_json::to_string(&row).expect("serialize cells");
        assert_eq!(json, r#"[null,3,"Headache"]"#);
    }

    #[test]
    fn row_set_lookup_by_column() {
        let set = RowSet {
            columns: vec!["RFSTDTC".to_string(), "RFENDTC".to_string()],
            rows: vec![vec![CellValue::text("2024-01-01"), CellValue::Null]],
        };
        assert_eq!(
            set.first_value("RFSTDTC"),
            Some(&CellValue::text("2024-01-01"))
        );
        assert_eq!(set.first_value("RFENDTC"), Some(&CellValue::Null));
        assert_eq!(set.first_value("MISSING"), None);
        assert_eq!(set.column_values("RFSTDTC").len(), 1);
    }
}
