use sdtm_model::{QueryModule, Retrieval, TemporalMode};

use super::{HandlerContext, ModuleHandler, OutputColumn, temporal_retrieval};
use crate::error::Result;
use crate::specification::QuerySpecification;

const PROJECTION: &[OutputColumn] = &[
    OutputColumn::plain("AETOXGR", "Grade/Severity"),
    OutputColumn::plain("AESTDTC", "Start Date"),
    OutputColumn::plain("AESTDY", "Start Date Study Day"),
    OutputColumn::plain("AEENDY", "End Date Study Day"),
    OutputColumn::plain("AEDECOD", "Preferred Term"),
];

/// Adverse events (AE), ranked per preferred term.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdverseEventsHandler;

impl ModuleHandler for AdverseEventsHandler {
    type Mode = TemporalMode;

    fn module(&self) -> QueryModule {
        QueryModule::AdverseEvents
    }

    fn projection(&self) -> &'static [OutputColumn] {
        PROJECTION
    }

    fn partition_key(&self) -> Option<&'static str> {
        Some("AEDECOD")
    }

    fn build(
        &self,
        mode: TemporalMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        let base = self.base_retrieval(spec, ctx);
        temporal_retrieval(self, base, mode, spec, ctx, "AESTDTC")
    }
}
