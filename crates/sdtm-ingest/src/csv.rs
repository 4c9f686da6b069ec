//! CSV dataset reading.

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, DataType, NamedFrom, SerReader, Series};

use crate::error::{IngestError, Result};
use crate::polars_utils::{parse_f64, parse_i64};

/// Name suffixes of SDTM numeric variables (`--SEQ`, `--DY`, `--STDY`,
/// `--ENDY`, `--STRESN`, `--STNRLO`, `--STNRHI`).
const NUMERIC_SUFFIXES: [&str; 5] = ["SEQ", "DY", "STRESN", "STNRLO", "STNRHI"];

/// Reads a single-header CSV dataset into a Polars DataFrame.
///
/// Every cell is read as text, so character variables such as `USUBJID`
/// keep leading zeros. Column names are trimmed and upper-cased so that SDTM
/// variable names match regardless of how the export was written.
pub fn read_dataset(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let normalized: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| normalize_header(name.as_str()))
        .collect();
    df.set_column_names(normalized.iter().map(String::as_str))?;

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded dataset"
    );
    Ok(df)
}

/// Converts text columns named like SDTM numeric variables to numbers.
///
/// A column becomes `Int64` when every non-blank value is an integer and
/// `Float64` when every non-blank value is a number; otherwise it stays text.
pub fn type_numeric_columns(df: &mut DataFrame) -> Result<()> {
    let candidates: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| is_numeric_variable(name))
        .collect();

    for name in candidates {
        let column = df.column(&name)?;
        if column.dtype() != &DataType::String {
            continue;
        }
        let values: Vec<Option<&str>> = column
            .str()?
            .into_iter()
            .map(|value| value.filter(|v| !v.trim().is_empty()))
            .collect();

        let integers: Option<Vec<Option<i64>>> = values
            .iter()
            .map(|value| value.map_or(Some(None), |v| parse_i64(v).map(Some)))
            .collect();
        let typed = match integers {
            Some(integers) => Series::new(name.as_str().into(), integers),
            None => {
                let numbers: Option<Vec<Option<f64>>> = values
                    .iter()
                    .map(|value| value.map_or(Some(None), |v| parse_f64(v).map(Some)))
                    .collect();
                match numbers {
                    Some(numbers) => Series::new(name.as_str().into(), numbers),
                    None => {
                        tracing::debug!(column = %name, "non-numeric values, kept as text");
                        continue;
                    }
                }
            }
        };
        df.with_column(typed)?;
    }
    Ok(())
}

fn is_numeric_variable(name: &str) -> bool {
    NUMERIC_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_uppercase()
}
