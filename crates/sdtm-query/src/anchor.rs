//! Secondary anchor dates read from the subject's own records.

use chrono::NaiveDate;
use sdtm_model::{ColumnExpr, DatasetAccess, Predicate, Retrieval, extract_date};

use crate::error::{QueryError, Result};

const DEMOGRAPHICS: &str = "DM";
const EXPOSURE: &str = "EX";
const REFERENCE_START: &str = "RFSTDTC";
const REFERENCE_END: &str = "RFENDTC";
const EXPOSURE_START: &str = "EXSTDTC";
const FIRST_DOSE: &str = "FIRST_DOSE";

/// The subject's reference start and end dates from demographics.
///
/// Either may be absent on older records; handlers then skip the study
/// window instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudyBounds {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Looks up anchor dates the caller does not supply.
#[derive(Debug, Clone, Copy)]
pub struct AnchorDateProvider<'a, A: ?Sized> {
    access: &'a A,
    schema: &'a str,
}

impl<'a, A: DatasetAccess + ?Sized> AnchorDateProvider<'a, A> {
    pub fn new(access: &'a A, schema: &'a str) -> Self {
        Self { access, schema }
    }

    /// Reads RFSTDTC/RFENDTC for `subject`.
    ///
    /// Fails with `NotFound` when the subject has no demographics record.
    /// Values that are not complete dates read as absent.
    pub fn resolve_study_bounds(&self, subject: &str) -> Result<StudyBounds> {
        let retrieval = Retrieval::new(self.schema, DEMOGRAPHICS, subject)
            .select_column(REFERENCE_START)
            .select_column(REFERENCE_END);
        let rows = self.access.execute_read_only(&retrieval)?;
        if rows.is_empty() {
            return Err(QueryError::NotFound {
                what: "study reference dates",
                subject: subject.to_string(),
            });
        }

        let read = |column: &str| {
            rows.first_value(column)
                .and_then(|cell| extract_date(&cell.as_text()))
        };
        let bounds = StudyBounds {
            start: read(REFERENCE_START),
            end: read(REFERENCE_END),
        };
        tracing::debug!(?bounds, "study bounds");
        Ok(bounds)
    }

    /// Earliest complete EXSTDTC date across the subject's exposure records.
    pub fn resolve_first_dose_date(&self, subject: &str) -> Result<NaiveDate> {
        let retrieval = Retrieval::new(self.schema, EXPOSURE, subject)
            .select(ColumnExpr::min(EXPOSURE_START), Some(FIRST_DOSE))
            .filter(Predicate::has_date(EXPOSURE_START));
        let rows = self.access.execute_read_only(&retrieval)?;

        let first_dose = rows
            .first_value(FIRST_DOSE)
            .and_then(|cell| extract_date(&cell.as_text()))
            .ok_or_else(|| QueryError::NotFound {
                what: "exposure records",
                subject: subject.to_string(),
            })?;
        tracing::debug!(%first_dose, "first dose");
        Ok(first_dose)
    }
}
