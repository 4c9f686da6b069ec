//! Evaluation of retrieval plans over an in-memory dataset.
//!
//! A [`Retrieval`] is translated into a Polars lazy query. Only the columns a
//! plan reads are selected, under their upper-cased names. Evaluation follows
//! the order documented on [`Retrieval`]: subject and row predicates, ranking,
//! grouping and projection, ordering, `DISTINCT`. Values become [`CellValue`]s
//! only once the query has been collected.
//!
//! [`CellValue`]: sdtm_model::CellValue

use chrono::NaiveDate;
use polars::prelude::{
    DataFrame, DataType, Expr, IntoLazy, LazyFrame, NULL, NamedFrom, PolarsError, PolarsResult,
    RoundMode, Series, SortMultipleOptions, StrptimeOptions, UniqueKeepStrategy, col, concat_str,
    lit,
};
use sdtm_model::{
    ColumnExpr, DataAccessError, Predicate, RankRule, Ranking, Retrieval, RowSet, SUBJECT_COLUMN,
};

use crate::polars_utils::{any_to_cell, find_column};

/// Dataset position of a row; the last ranking key.
const ROW_INDEX: &str = "__row";
/// Position of the winning row of the partition.
const WINNER: &str = "__winner";
const GROUP_KEY: &str = "__group";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Runs `retrieval` against `df`, the dataset named by `retrieval.table`.
pub fn execute(df: &DataFrame, retrieval: &Retrieval) -> Result<RowSet, DataAccessError> {
    let mut lf = source_frame(df, retrieval)?
        .filter(folded(SUBJECT_COLUMN).eq(lit(fold(&retrieval.subject))));
    for predicate in &retrieval.filters {
        lf = lf.filter(predicate_expr(predicate));
    }
    if let Some(ranking) = &retrieval.ranking {
        lf = rank(lf, ranking);
    }

    let outputs: Vec<String> = (0..retrieval.select.len())
        .map(|idx| format!("__c{idx}"))
        .collect();
    let keys: Vec<String> = (0..retrieval.order_by.len())
        .map(|idx| format!("__o{idx}"))
        .collect();

    let aggregate = retrieval.is_aggregate();
    let project = |expr: &ColumnExpr| {
        if aggregate {
            aggregate_expr(expr)
        } else {
            value_expr(expr)
        }
    };
    let mut exprs: Vec<Expr> = retrieval
        .select
        .iter()
        .zip(&outputs)
        .map(|(item, name)| project(&item.expr).alias(name.as_str()))
        .collect();
    exprs.extend(
        retrieval
            .order_by
            .iter()
            .zip(&keys)
            .map(|(key, name)| project(&key.expr).alias(name.as_str())),
    );

    lf = match &retrieval.group_by {
        Some(column) => lf
            .group_by_stable([text(column).alias(GROUP_KEY)])
            .agg(exprs),
        None => lf.select(exprs),
    };

    if !keys.is_empty() {
        // SQL places nulls first in ascending order and last in descending.
        let descending: Vec<bool> = retrieval.order_by.iter().map(|key| key.descending).collect();
        lf = lf.sort_by_exprs(
            keys.iter().map(|name| col(name.as_str())).collect::<Vec<_>>(),
            SortMultipleOptions::default()
                .with_order_descending_multi(descending.clone())
                .with_nulls_last_multi(descending)
                .with_maintain_order(true),
        );
    }

    lf = lf.select(
        outputs
            .iter()
            .map(|name| col(name.as_str()))
            .collect::<Vec<_>>(),
    );
    if retrieval.distinct {
        lf = lf.unique_stable(None, UniqueKeepStrategy::First);
    }

    let frame = lf.collect().map_err(backend)?;
    row_set(&frame, &outputs, retrieval.output_columns())
}

/// Selects the columns the plan reads, renamed to their upper-cased names.
fn source_frame(df: &DataFrame, retrieval: &Retrieval) -> Result<LazyFrame, DataAccessError> {
    let columns = retrieval
        .source_columns()
        .into_iter()
        .map(|name| {
            let actual =
                find_column(df, &name).ok_or_else(|| DataAccessError::ColumnNotFound {
                    table: retrieval.table.clone(),
                    column: name.clone(),
                })?;
            Ok(col(actual).alias(name.to_uppercase()))
        })
        .collect::<Result<Vec<_>, DataAccessError>>()?;
    Ok(df.clone().lazy().select(columns))
}

/// Keeps the winning row of each partition, in dataset order.
///
/// Rows are sorted by the rule's keys with the dataset position last, so the
/// first row of each partition is its winner.
fn rank(lf: LazyFrame, ranking: &Ranking) -> LazyFrame {
    let mut keys: Vec<Expr> = Vec::new();
    let mut descending: Vec<bool> = Vec::new();
    match ranking.rule {
        RankRule::Nearest => {
            let target = lit(epoch_day(ranking.target));
            let day = day_number(&ranking.date_column);
            keys.push(day.clone().neq(target.clone()));
            keys.push((day.clone() - target).abs());
            keys.push(day);
            descending.extend([false, false, false]);
        }
        RankRule::MostRecent => {
            keys.push(text(&ranking.date_column));
            descending.push(true);
        }
    }
    keys.push(col(ROW_INDEX));
    descending.push(false);
    let nulls_last = vec![true; keys.len()];

    let partition = folded(&ranking.partition).fill_null(lit(""));
    lf.with_row_index(ROW_INDEX, None)
        .sort_by_exprs(
            keys,
            SortMultipleOptions::default()
                .with_order_descending_multi(descending)
                .with_nulls_last_multi(nulls_last)
                .with_maintain_order(true),
        )
        .with_column(col(ROW_INDEX).first().over([partition]).alias(WINNER))
        .filter(col(ROW_INDEX).eq(col(WINNER)))
        .sort_by_exprs([col(ROW_INDEX)], SortMultipleOptions::default())
}

fn predicate_expr(predicate: &Predicate) -> Expr {
    match predicate {
        Predicate::Equals { column, value } => folded(column).eq(lit(fold(value))),
        Predicate::InList { column, values } => {
            let values: Vec<String> = values.iter().map(|value| fold(value)).collect();
            folded(column).is_in(lit(Series::new("".into(), values)), false)
        }
        Predicate::DateBetween { column, low, high } => {
            let day = day_number(column);
            day.clone()
                .gt_eq(lit(epoch_day(*low)))
                .and(day.lt_eq(lit(epoch_day(*high))))
        }
        Predicate::DateOnOrBefore { column, bound } => {
            day_number(column).lt_eq(lit(epoch_day(*bound)))
        }
        Predicate::DateBefore { column, bound } => day_number(column).lt(lit(epoch_day(*bound))),
        Predicate::HasDate { column } => day_number(column).is_not_null(),
        Predicate::Blank { column } => text(column).fill_null(lit("")).eq(lit("")),
        Predicate::NotBlank { column } => present(column),
        Predicate::ContainsAny { column, terms } => terms
            .iter()
            .map(|term| folded(column).str().contains_literal(lit(fold(term))))
            .reduce(|left, right| left.or(right))
            .unwrap_or_else(|| lit(false))
            .fill_null(lit(false)),
        Predicate::All(parts) => parts
            .iter()
            .map(predicate_expr)
            .reduce(|left, right| left.and(right))
            .unwrap_or_else(|| lit(true)),
        Predicate::Any(parts) => parts
            .iter()
            .map(predicate_expr)
            .reduce(|left, right| left.or(right))
            .unwrap_or_else(|| lit(false)),
    }
}

/// Row-level value of `expr`. Aggregates read their column as-is.
fn value_expr(expr: &ColumnExpr) -> Expr {
    match expr {
        ColumnExpr::Column(column) | ColumnExpr::Min(column) | ColumnExpr::Max(column) => {
            source(column)
        }
        ColumnExpr::Round { column, digits } => source(column)
            .cast(DataType::Float64)
            .round(*digits, RoundMode::HalfAwayFromZero),
        ColumnExpr::Concat { columns, separator } => concat_str(
            columns
                .iter()
                .map(|column| text(column).fill_null(lit("")))
                .collect::<Vec<_>>(),
            separator,
            false,
        ),
    }
}

/// Group-level value of `expr`. Plain expressions read the first row of the
/// group; `MIN` and `MAX` ignore blanks.
fn aggregate_expr(expr: &ColumnExpr) -> Expr {
    match expr {
        ColumnExpr::Min(column) => source(column).filter(present(column)).min(),
        ColumnExpr::Max(column) => source(column).filter(present(column)).max(),
        other => value_expr(other).first(),
    }
}

fn source(column: &str) -> Expr {
    col(column.to_uppercase())
}

/// Trimmed text of a column of any type.
fn text(column: &str) -> Expr {
    source(column)
        .cast(DataType::String)
        .str()
        .strip_chars(lit(NULL))
}

/// Comparison form of a column: trimmed and upper-cased.
fn folded(column: &str) -> Expr {
    text(column).str().to_uppercase()
}

fn fold(value: &str) -> String {
    value.trim().to_uppercase()
}

fn present(column: &str) -> Expr {
    text(column).fill_null(lit("")).neq(lit(""))
}

/// Day number of the date in the first ten characters of a timing value,
/// null when they are not a complete `YYYY-MM-DD` date.
fn day_number(column: &str) -> Expr {
    text(column)
        .str()
        .slice(lit(0i64), lit(10u64))
        .str()
        .to_date(StrptimeOptions {
            format: Some(DATE_FORMAT.into()),
            strict: false,
            exact: true,
            cache: true,
        })
        .cast(DataType::Int32)
}

/// Days since 1970-01-01, the physical value of a Polars date.
fn epoch_day(date: NaiveDate) -> i32 {
    let days = date.signed_duration_since(NaiveDate::default()).num_days();
    i32::try_from(days).unwrap_or(i32::MAX)
}

fn row_set(
    frame: &DataFrame,
    names: &[String],
    columns: Vec<String>,
) -> Result<RowSet, DataAccessError> {
    let sources = names
        .iter()
        .map(|name| frame.column(name.as_str()))
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(backend)?;
    let mut rows = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let row = sources
            .iter()
            .map(|column| column.get(idx).map(any_to_cell))
            .collect::<PolarsResult<Vec<_>>>()
            .map_err(backend)?;
        rows.push(row);
    }
    Ok(RowSet { columns, rows })
}

fn backend(error: PolarsError) -> DataAccessError {
    DataAccessError::backend(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;
    use sdtm_model::CellValue;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn vital_signs() -> DataFrame {
        df! {
            "USUBJID" => ["01-001", "01-001", "01-001", "01-001", "01-002"],
            "VSTEST" => ["Pulse", "Pulse", "Pulse", "Weight", "Pulse"],
            "VSSTRESN" => [70.0, 72.0, 75.0, 80.5, 64.0],
            "VSDTC" => ["2024-01-28", "2024-02-03", "2024-02-05T10:00", "2024-01-15", "2024-02-01"],
        }
        .unwrap()
    }

    #[test]
    fn test_epoch_day() {
        assert_eq!(epoch_day(date(1970, 1, 1)), 0);
        assert_eq!(epoch_day(date(1970, 1, 31)), 30);
        assert_eq!(epoch_day(date(1969, 12, 31)), -1);
    }

    #[test]
    fn test_filters_by_subject_and_dates() {
        let retrieval = Retrieval::new("P01_sdtm", "VS", "01-001")
            .select_column("VSTEST")
            .select_column("VSSTRESN")
            .filter(Predicate::date_between(
                "VSDTC",
                date(2024, 2, 1),
                date(2024, 2, 29),
            ))
            .order_by(ColumnExpr::column("VSDTC"));
        let rows = execute(&vital_signs(), &retrieval).unwrap();

        assert_eq!(rows.columns, vec!["VSTEST", "VSSTRESN"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows.column_values("VSSTRESN"),
            vec![&CellValue::Number(72.0), &CellValue::Number(75.0)]
        );
    }

    #[test]
    fn test_partial_dates_never_match_windows() {
        let df = df! {
            "USUBJID" => ["01-001", "01-001", "01-001"],
            "CMTRT" => ["ASPIRIN", "IBUPROFEN", "PARACETAMOL"],
            "CMSTDTC" => ["2024-01", "2024-01-12T08:00", "unknown"],
        }
        .unwrap();
        let retrieval = Retrieval::new("P01_sdtm", "CM", "01-001")
            .select_column("CMTRT")
            .filter(Predicate::date_between(
                "CMSTDTC",
                date(2024, 1, 1),
                date(2024, 1, 31),
            ));
        let rows = execute(&df, &retrieval).unwrap();

        assert_eq!(rows.rows, vec![vec![CellValue::text("IBUPROFEN")]]);
    }

    #[test]
    fn test_nearest_prefers_earlier_on_equal_distance() {
        let retrieval = Retrieval::new("P01_sdtm", "VS", "01-001")
            .select_column("VSTEST")
            .select_column("VSSTRESN")
            .filter(Predicate::has_date("VSDTC"))
            .rank_by(Ranking {
                partition: "VSTEST".to_string(),
                date_column: "VSDTC".to_string(),
                target: date(2024, 1, 31),
                rule: RankRule::Nearest,
            })
            .order_by(ColumnExpr::column("VSTEST"));
        let rows = execute(&vital_signs(), &retrieval).unwrap();

        // 2024-01-28 and 2024-02-03 are both three days away.
        assert_eq!(
            rows.column_values("VSSTRESN"),
            vec![&CellValue::Number(70.0), &CellValue::Number(80.5)]
        );
    }

    #[test]
    fn test_most_recent_uses_full_timing_text() {
        let df = df! {
            "USUBJID" => ["01-001", "01-001", "01-001"],
            "AEDECOD" => ["Nausea", "Nausea", "Nausea"],
            "AETOXGR" => ["1", "2", "3"],
            "AESTDTC" => ["2024-01-10T08:00", "2024-01-10T17:30", "2024-01-02"],
        }
        .unwrap();
        let retrieval = Retrieval::new("P01_sdtm", "AE", "01-001")
            .select_column("AETOXGR")
            .filter(Predicate::date_on_or_before("AESTDTC", date(2024, 1, 10)))
            .rank_by(Ranking {
                partition: "AEDECOD".to_string(),
                date_column: "AESTDTC".to_string(),
                target: date(2024, 1, 10),
                rule: RankRule::MostRecent,
            });
        let rows = execute(&df, &retrieval).unwrap();

        assert_eq!(rows.first_value("AETOXGR"), Some(&CellValue::text("2")));
    }

    #[test]
    fn test_most_recent_tie_keeps_earlier_row() {
        let df = df! {
            "USUBJID" => ["01-001", "01-001", "01-001", "01-001"],
            "AEDECOD" => ["Nausea", "Rash", "Nausea", "rash "],
            "AETOXGR" => ["1", "2", "3", "4"],
            "AESTDTC" => ["2024-01-10", "2024-01-04", "2024-01-10", "2024-01-04"],
        }
        .unwrap();
        let retrieval = Retrieval::new("P01_sdtm", "AE", "01-001")
            .select_column("AEDECOD")
            .select_column("AETOXGR")
            .rank_by(Ranking {
                partition: "AEDECOD".to_string(),
                date_column: "AESTDTC".to_string(),
                target: date(2024, 1, 10),
                rule: RankRule::MostRecent,
            });
        let rows = execute(&df, &retrieval).unwrap();

        assert_eq!(
            rows.column_values("AETOXGR"),
            vec![&CellValue::text("1"), &CellValue::text("2")]
        );
    }

    #[test]
    fn test_grouped_aggregates_skip_blanks() {
        let df = df! {
            "USUBJID" => ["01-001", "01-001", "01-001"],
            "EXTRT" => ["DRUG A", "DRUG A", "DRUG B"],
            "EXSTDTC" => ["2024-01-10", "2024-01-03", "2024-01-05"],
            "EXENDTC" => ["2024-01-20", "", "2024-01-06"],
        }
        .unwrap();
        let retrieval = Retrieval::new("P01_sdtm", "EX", "01-001")
            .select_column("EXTRT")
            .select(ColumnExpr::min("EXSTDTC"), Some("First"))
            .select(ColumnExpr::max("EXENDTC"), Some("Last"))
            .group_by("EXTRT")
            .order_by(ColumnExpr::min("EXSTDTC"));
        let rows = execute(&df, &retrieval).unwrap();

        assert_eq!(
            rows.rows,
            vec![
                vec![
                    CellValue::text("DRUG A"),
                    CellValue::text("2024-01-03"),
                    CellValue::text("2024-01-20"),
                ],
                vec![
                    CellValue::text("DRUG B"),
                    CellValue::text("2024-01-05"),
                    CellValue::text("2024-01-06"),
                ],
            ]
        );
    }

    #[test]
    fn test_ungrouped_aggregate_over_no_rows_is_null() {
        let retrieval = Retrieval::new("P01_sdtm", "VS", "01-999")
            .select(ColumnExpr::min("VSDTC"), Some("First"));
        let rows = execute(&vital_signs(), &retrieval).unwrap();

        assert_eq!(rows.rows, vec![vec![CellValue::Null]]);
    }

    #[test]
    fn test_distinct_and_case_insensitive_match() {
        let retrieval = Retrieval::new("P01_sdtm", "VS", " 01-001 ")
            .select_column("VSTEST")
            .distinct()
            .filter(Predicate::in_list("VSTEST", vec!["pulse".to_string()]));
        let rows = execute(&vital_signs(), &retrieval).unwrap();

        assert_eq!(rows.rows, vec![vec![CellValue::text("Pulse")]]);
    }

    #[test]
    fn test_contains_any_and_blank() {
        let df = df! {
            "USUBJID" => ["01-001", "01-001", "01-001"],
            "EXTRT" => ["DRUG A", "DRUG A", "DRUG A"],
            "EXADJ" => ["Dose held for AE", "", "Reduced"],
        }
        .unwrap();
        let adjusted = Retrieval::new("P01_sdtm", "EX", "01-001")
            .select_column("EXADJ")
            .filter(Predicate::contains_any("EXADJ", &["Held", "Missed"]));
        let rows = execute(&df, &adjusted).unwrap();
        assert_eq!(rows.rows, vec![vec![CellValue::text("Dose held for AE")]]);

        let unadjusted = Retrieval::new("P01_sdtm", "EX", "01-001")
            .select_column("EXTRT")
            .filter(Predicate::blank("EXADJ"));
        assert_eq!(execute(&df, &unadjusted).unwrap().len(), 1);
    }

    #[test]
    fn test_round_and_concat() {
        let df = df! {
            "USUBJID" => ["01-001"],
            "LBSTNRLO" => [4.2361],
            "EXDOSE" => ["50"],
            "EXDOSU" => ["mg"],
        }
        .unwrap();
        let retrieval = Retrieval::new("P01_sdtm", "LB", "01-001")
            .select(ColumnExpr::round("LBSTNRLO", 2), None)
            .select(ColumnExpr::concat(&["EXDOSE", "EXDOSU"], " "), None);
        let rows = execute(&df, &retrieval).unwrap();

        assert_eq!(
            rows.rows,
            vec![vec![CellValue::Number(4.24), CellValue::text("50 mg")]]
        );
    }

    #[test]
    fn test_missing_column_is_reported() {
        let retrieval = Retrieval::new("P01_sdtm", "VS", "01-001").select_column("VSPOS");
        let err = execute(&vital_signs(), &retrieval).unwrap_err();
        assert!(matches!(
            err,
            DataAccessError::ColumnNotFound { ref column, .. } if column == "VSPOS"
        ));
    }
}
