use sdtm_model::{ColumnExpr, Predicate, ProcedureMode, QueryModule, Retrieval};

use super::{HandlerContext, ModuleHandler, OutputColumn, interval_retrieval};
use crate::error::Result;
use crate::specification::QuerySpecification;
use crate::window::WindowMode;

const PROJECTION: &[OutputColumn] = &[
    OutputColumn::plain("PRCAT", "Category"),
    OutputColumn::plain("PRDECOD", "Standardized Procedure Name"),
    OutputColumn::plain("PRSTDTC", "Start Date/Time of Procedure"),
    OutputColumn::plain("PRENDTC", "End Date/Time of Procedure"),
    OutputColumn::plain("PRSTDY", "Study Day of Start of Procedure"),
    OutputColumn::plain("PRENDY", "Study Day of End of Procedure"),
];

/// Procedures (PR).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduresHandler;

impl ModuleHandler for ProceduresHandler {
    type Mode = ProcedureMode;

    fn module(&self) -> QueryModule {
        QueryModule::Procedures
    }

    fn projection(&self) -> &'static [OutputColumn] {
        PROJECTION
    }

    fn partition_key(&self) -> Option<&'static str> {
        None
    }

    fn build(
        &self,
        mode: ProcedureMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        let categories = ctx.categories();
        let base = self
            .base_retrieval(spec, ctx)
            .filter_opt(categories.resolve(&spec.categories, "PRCAT").predicate("PRCAT"))
            .filter_opt(
                categories
                    .resolve(&spec.indications, "PRINDC")
                    .predicate("PRINDC"),
            );

        let retrieval = match mode {
            ProcedureMode::Study => {
                let bounds = ctx.anchors().resolve_study_bounds(&spec.subject)?;
                match bounds.start.zip(bounds.end) {
                    Some((start, end)) => {
                        base.filter(Predicate::date_between("PRSTDTC", start, end))
                    }
                    None => {
                        tracing::warn!(
                            module = %self.module(),
                            "reference dates incomplete, study window not applied"
                        );
                        base
                    }
                }
            }
            ProcedureMode::PriorFirst => {
                let first_dose = ctx.anchors().resolve_first_dose_date(&spec.subject)?;
                base.filter(Predicate::date_before("PRSTDTC", first_dose))
            }
            ProcedureMode::During => {
                interval_retrieval(base, WindowMode::During, spec, ctx, "PRSTDTC")?
            }
            ProcedureMode::WithinDays => {
                interval_retrieval(base, WindowMode::WithinDays, spec, ctx, "PRSTDTC")?
            }
        };
        Ok(retrieval.order_by(ColumnExpr::column("PRSTDTC")))
    }
}
