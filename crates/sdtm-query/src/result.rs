//! Query results and their serialized shape.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use sdtm_model::{CellValue, DatasetAccess, Retrieval, RowSet};

use crate::error::Result;

/// Text returned in place of rows when a read matches nothing.
pub const NO_DATA_FOUND: &str = "No data found";

/// One result row: labelled values in projection order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub values: Vec<(String, CellValue)>,
}

impl ResultRow {
    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| value)
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (label, value) in &self.values {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Rows, or the no-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<ResultRow>),
    NoData,
}

impl QueryOutcome {
    pub fn rows(&self) -> &[ResultRow] {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::NoData => &[],
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, QueryOutcome::NoData)
    }
}

impl Serialize for QueryOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            QueryOutcome::NoData => serializer.serialize_str(NO_DATA_FOUND),
            QueryOutcome::Rows(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
        }
    }
}

/// The answer to one standard query.
///
/// Serializes as `{"retrievalExpression": ..., "result": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// The read issued, rendered as SQL, for audit and display.
    pub retrieval_expression: String,
    pub result: QueryOutcome,
    /// Output column labels, also known when no rows came back.
    #[serde(skip)]
    pub columns: Vec<String>,
}

/// Executes retrievals and shapes their rows.
#[derive(Debug, Clone, Copy)]
pub struct ResultFormatter<'a, A: ?Sized> {
    access: &'a A,
}

impl<'a, A: DatasetAccess + ?Sized> ResultFormatter<'a, A> {
    pub fn new(access: &'a A) -> Self {
        Self { access }
    }

    /// Runs `retrieval` read-only. Backend failures propagate; zero rows
    /// become [`QueryOutcome::NoData`].
    pub fn execute(&self, retrieval: &Retrieval) -> Result<QueryResult> {
        let retrieval_expression = retrieval.to_string();
        // The rendered expression names the subject.
        tracing::trace!(expression = %retrieval_expression, "executing retrieval");

        let rows = self.access.execute_read_only(retrieval)?;
        tracing::debug!(rows = rows.len(), "retrieval returned");
        Ok(format_rows(retrieval_expression, rows))
    }
}

fn format_rows(retrieval_expression: String, rows: RowSet) -> QueryResult {
    let RowSet { columns, rows } = rows;
    let result = if rows.is_empty() {
        QueryOutcome::NoData
    } else {
        QueryOutcome::Rows(
            rows.into_iter()
                .map(|values| ResultRow {
                    values: columns.iter().cloned().zip(values).collect(),
                })
                .collect(),
        )
    };
    QueryResult {
        retrieval_expression,
        result,
        columns,
    }
}
