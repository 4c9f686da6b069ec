use sdtm_model::{Predicate, QueryModule, Retrieval, TemporalMode};

use super::{HandlerContext, ModuleHandler, OutputColumn, temporal_retrieval};
use crate::error::{QueryError, Result};
use crate::specification::QuerySpecification;

const PROJECTION: &[OutputColumn] = &[
    OutputColumn::plain("VSTEST", "Vital Signs Test Name"),
    OutputColumn::plain("VSSTRESN", "Numeric Result/Finding in Standard Units"),
    OutputColumn::plain("VSSTRESU", "Standard Units"),
    OutputColumn::plain("VSDTC", "Date/Time of Measurements"),
    OutputColumn::plain("VSDY", "Study Day of Vital Signs"),
];

/// Vital sign measurements (VS).
#[derive(Debug, Clone, Copy, Default)]
pub struct VitalSignsHandler;

impl ModuleHandler for VitalSignsHandler {
    type Mode = TemporalMode;

    fn module(&self) -> QueryModule {
        QueryModule::VitalSigns
    }

    fn projection(&self) -> &'static [OutputColumn] {
        PROJECTION
    }

    fn partition_key(&self) -> Option<&'static str> {
        Some("VSTEST")
    }

    fn build(
        &self,
        mode: TemporalMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        if spec.tests.is_empty() {
            return Err(QueryError::MissingParameter {
                parameter: "VSTEST",
                mode: mode.as_str(),
            });
        }
        let base = self
            .base_retrieval(spec, ctx)
            .filter(Predicate::in_list("VSTEST", spec.tests.clone()));
        temporal_retrieval(self, base, mode, spec, ctx, "VSDTC")
    }
}
