use sdtm_model::{ColumnExpr, DispositionMode, Predicate, QueryModule, Retrieval};

use super::{HandlerContext, ModuleHandler, OutputColumn};
use crate::error::Result;
use crate::specification::QuerySpecification;

const PROJECTION: &[OutputColumn] = &[
    OutputColumn::plain("DSTERM", "Reported Term for the Disposition Event (DSTERM)"),
    OutputColumn::plain("DSDECOD", "Standardized Disposition Term (DSDECOD)"),
    OutputColumn::plain("DSSTDTC", "Start Date/Time of Disposition Event (DSSTDTC)"),
    OutputColumn::plain("DSSTDY", "Study Day of Start of Disposition Event (DSSTDY)"),
];

/// Disposition events (DS). Lookups select by DSSCAT; no date window.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispositionHandler;

impl ModuleHandler for DispositionHandler {
    type Mode = DispositionMode;

    fn module(&self) -> QueryModule {
        QueryModule::Disposition
    }

    fn projection(&self) -> &'static [OutputColumn] {
        PROJECTION
    }

    fn partition_key(&self) -> Option<&'static str> {
        None
    }

    fn build(
        &self,
        mode: DispositionMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        Ok(self
            .base_retrieval(spec, ctx)
            .filter(Predicate::equals("DSSCAT", mode.category_code()))
            .order_by(ColumnExpr::column("DSSTDTC")))
    }
}
