use sdtm_model::{Predicate, QueryModule, Retrieval, TemporalMode};

use super::{Field, HandlerContext, ModuleHandler, OutputColumn, temporal_retrieval};
use crate::error::{QueryError, Result};
use crate::specification::QuerySpecification;

const PROJECTION: &[OutputColumn] = &[
    OutputColumn::plain("LBTEST", "Lab Test or Examination Name"),
    OutputColumn::plain("LBSTRESC", "Character Result/Finding in Std Format"),
    OutputColumn::plain("LBSTRESU", "Standard Units"),
    OutputColumn {
        field: Field::Rounded("LBSTNRLO", 2),
        label: "Reference Range Lower Limit-Std Units",
    },
    OutputColumn {
        field: Field::Rounded("LBSTNRHI", 2),
        label: "Reference Range Upper Limit-Std Units",
    },
    OutputColumn::plain("LBDTC", "Date/Time of Specimen Collection"),
];

/// Laboratory results (LB), one row per specimen and test.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaboratoryHandler;

impl ModuleHandler for LaboratoryHandler {
    type Mode = TemporalMode;

    fn module(&self) -> QueryModule {
        QueryModule::Laboratory
    }

    fn projection(&self) -> &'static [OutputColumn] {
        PROJECTION
    }

    fn partition_key(&self) -> Option<&'static str> {
        Some("LBTEST")
    }

    fn build(
        &self,
        mode: TemporalMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        if spec.tests.is_empty() {
            return Err(QueryError::MissingParameter {
                parameter: "LBTEST",
                mode: mode.as_str(),
            });
        }
        let category = spec
            .test_category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .ok_or(QueryError::MissingParameter {
                parameter: "LBCAT",
                mode: mode.as_str(),
            })?;

        let base = self
            .base_retrieval(spec, ctx)
            .filter(Predicate::in_list("LBTEST", spec.tests.clone()))
            .filter(Predicate::equals("LBCAT", category));
        temporal_retrieval(self, base, mode, spec, ctx, "LBDTC")
    }
}
