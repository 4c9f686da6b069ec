//! In-memory study datasets.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use polars::prelude::{
    DataFrame, DataType, IntoLazy, NULL, PolarsResult, UniqueKeepStrategy, col, lit,
};
use sdtm_model::{DataAccessError, DatasetAccess, Retrieval, RowSet, SUBJECT_COLUMN};

use crate::csv::{read_dataset, type_numeric_columns};
use crate::discovery::{STUDY_DOMAINS, discover_domain_files, list_csv_files};
use crate::error::{IngestError, Result};
use crate::executor::execute;
use crate::polars_utils::find_column;

/// The SDTM datasets of one project folder, addressed by dataset schema.
///
/// Datasets are keyed by upper-case domain code. The store is immutable once
/// built and only serves reads, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct StudyStore {
    schema: String,
    frames: BTreeMap<String, DataFrame>,
}

impl StudyStore {
    /// Creates an empty store answering for `schema` (e.g. `P01_sdtm`).
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            frames: BTreeMap::new(),
        }
    }

    /// Adds or replaces the dataset for `table`.
    #[must_use]
    pub fn with_frame(mut self, table: &str, df: DataFrame) -> Self {
        self.insert(table, df);
        self
    }

    pub fn insert(&mut self, table: &str, df: DataFrame) {
        self.frames.insert(table.trim().to_uppercase(), df);
    }

    /// Loads every supported domain found in `dir`.
    ///
    /// Split files of one domain are stacked in filename order and must share
    /// column names. Numeric SDTM variables are typed once the domain is
    /// combined; everything else stays text.
    pub fn load(dir: &Path, schema: impl Into<String>) -> Result<Self> {
        let files = list_csv_files(dir)?;
        let grouped = discover_domain_files(&files, &STUDY_DOMAINS);
        if grouped.is_empty() {
            return Err(IngestError::NoDomainFiles {
                path: dir.to_path_buf(),
            });
        }

        let mut store = Self::new(schema);
        for (domain, paths) in grouped {
            let mut combined: Option<DataFrame> = None;
            for path in &paths {
                let df = read_dataset(path)?;
                combined = Some(match combined {
                    None => df,
                    Some(mut acc) => {
                        stack(&mut acc, &df).map_err(|message| IngestError::Combine {
                            domain: domain.clone(),
                            message,
                        })?;
                        acc
                    }
                });
            }
            if let Some(mut df) = combined {
                type_numeric_columns(&mut df)?;
                tracing::info!(
                    domain = %domain,
                    files = paths.len(),
                    rows = df.height(),
                    "domain loaded"
                );
                store.insert(&domain, df);
            }
        }
        Ok(store)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Loaded domain codes, sorted.
    pub fn tables(&self) -> Vec<&str> {
        self.frames.keys().map(String::as_str).collect()
    }

    pub fn frame(&self, table: &str) -> Option<&DataFrame> {
        self.frames.get(&table.trim().to_uppercase())
    }

    /// Subjects present in every table of `tables`, sorted.
    ///
    /// With no tables listed, demographics is used when loaded since it lists
    /// every enrolled subject; otherwise subjects from all datasets are
    /// returned.
    pub fn subjects(
        &self,
        tables: &[&str],
    ) -> std::result::Result<Vec<String>, DataAccessError> {
        if tables.is_empty() {
            let sources: Vec<&DataFrame> = match self.frame("DM") {
                Some(dm) => vec![dm],
                None => self.frames.values().collect(),
            };
            let mut all = BTreeSet::new();
            for df in sources {
                all.extend(subject_set(df).map_err(backend)?);
            }
            return Ok(all.into_iter().collect());
        }

        let mut common: Option<BTreeSet<String>> = None;
        for table in tables {
            let df = self
                .frame(table)
                .ok_or_else(|| DataAccessError::TableNotFound {
                    schema: self.schema.clone(),
                    table: table.trim().to_uppercase(),
                })?;
            let present = subject_set(df).map_err(backend)?;
            common = Some(match common {
                None => present,
                Some(acc) => acc.intersection(&present).cloned().collect(),
            });
        }
        Ok(common.unwrap_or_default().into_iter().collect())
    }
}

/// Distinct non-blank subject identifiers of one dataset.
fn subject_set(df: &DataFrame) -> PolarsResult<BTreeSet<String>> {
    let Some(actual) = find_column(df, SUBJECT_COLUMN) else {
        return Ok(BTreeSet::new());
    };
    let subjects = df
        .clone()
        .lazy()
        .select([col(actual)
            .cast(DataType::String)
            .str()
            .strip_chars(lit(NULL))
            .alias(SUBJECT_COLUMN)])
        .filter(col(SUBJECT_COLUMN).neq(lit("")))
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(subjects
        .column(SUBJECT_COLUMN)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

fn backend(error: polars::prelude::PolarsError) -> DataAccessError {
    DataAccessError::backend(error.to_string())
}

fn stack(acc: &mut DataFrame, next: &DataFrame) -> std::result::Result<(), String> {
    let names: Vec<String> = acc
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let aligned = next
        .select(names.iter().map(String::as_str))
        .map_err(|e| e.to_string())?;
    acc.vstack_mut(&aligned).map_err(|e| e.to_string())?;
    Ok(())
}

impl DatasetAccess for StudyStore {
    fn execute_read_only(
        &self,
        retrieval: &Retrieval,
    ) -> std::result::Result<RowSet, DataAccessError> {
        if !retrieval.schema.eq_ignore_ascii_case(&self.schema) {
            return Err(DataAccessError::UnknownSchema {
                schema: retrieval.schema.clone(),
            });
        }
        let df = self
            .frame(&retrieval.table)
            .ok_or_else(|| DataAccessError::TableNotFound {
                schema: retrieval.schema.clone(),
                table: retrieval.table.clone(),
            })?;
        let rows = execute(df, retrieval)?;
        tracing::debug!(
            table = %retrieval.table,
            rows = rows.len(),
            "retrieval executed"
        );
        Ok(rows)
    }
}
