use chrono::NaiveDate;
use sdtm_model::{ColumnExpr, MedicationMode, Predicate, QueryModule, Retrieval};

use super::{HandlerContext, ModuleHandler, OutputColumn, interval_retrieval};
use crate::error::Result;
use crate::specification::QuerySpecification;
use crate::window::{WindowMode, shift_days};

const PROJECTION: &[OutputColumn] = &[
    OutputColumn::plain("CMDECOD", "Standardized Medication Name"),
    OutputColumn::plain("CMTRT", "Medication/Treatment"),
    OutputColumn::plain("CMDOSE", "Dose per Administration"),
    OutputColumn::plain("CMDOSU", "Dose Units"),
    OutputColumn::plain("CMSTDTC", "Start Date/Time of Medication"),
    OutputColumn::plain("CMENDTC", "End Date/Time of Medication"),
];

/// Days before the reference start covered by `prior_during`.
const PRIOR_DAYS: i64 = 30;

/// Concomitant and prior medications (CM).
#[derive(Debug, Clone, Copy, Default)]
pub struct MedicationsHandler;

impl ModuleHandler for MedicationsHandler {
    type Mode = MedicationMode;

    fn module(&self) -> QueryModule {
        QueryModule::Medications
    }

    fn projection(&self) -> &'static [OutputColumn] {
        PROJECTION
    }

    fn partition_key(&self) -> Option<&'static str> {
        None
    }

    fn build(
        &self,
        mode: MedicationMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        let categories = ctx.categories();
        let base = self
            .base_retrieval(spec, ctx)
            .filter_opt(categories.resolve(&spec.categories, "CMCAT").predicate("CMCAT"))
            .filter_opt(
                categories
                    .resolve(&spec.indications, "CMINDC")
                    .predicate("CMINDC"),
            );

        let retrieval = match mode {
            MedicationMode::PriorDuring => {
                let bounds = ctx.anchors().resolve_study_bounds(&spec.subject)?;
                let window = bounds
                    .start
                    .and_then(|start| shift_days(start, -PRIOR_DAYS))
                    .zip(bounds.end);
                match window {
                    Some((low, high)) => base.filter(overlaps_window(low, high)),
                    None => {
                        tracing::warn!(
                            module = %self.module(),
                            "reference dates incomplete, medication window not applied"
                        );
                        base
                    }
                }
            }
            MedicationMode::During => {
                interval_retrieval(base, WindowMode::During, spec, ctx, "CMSTDTC")?
            }
            MedicationMode::WithinDays => {
                interval_retrieval(base, WindowMode::WithinDays, spec, ctx, "CMSTDTC")?
            }
        };
        Ok(retrieval.order_by(ColumnExpr::column("CMSTDTC")))
    }
}

/// A medication qualifies when it starts or ends inside `[low, high]`, or
/// when either date is missing.
fn overlaps_window(low: NaiveDate, high: NaiveDate) -> Predicate {
    Predicate::Any(vec![
        Predicate::date_between("CMSTDTC", low, high),
        Predicate::date_between("CMENDTC", low, high),
        Predicate::blank("CMSTDTC"),
        Predicate::blank("CMENDTC"),
    ])
}
