//! Dispatch from module identifiers to handlers.

use sdtm_model::{ModuleQuery, QueryModule, Retrieval};

use crate::error::{QueryError, Result};
use crate::handlers::{
    AdverseEventsHandler, DispositionHandler, DosingExposureHandler, HandlerContext,
    LaboratoryHandler, MedicationsHandler, ModuleHandler, ProceduresHandler, VitalSignsHandler,
};
use crate::specification::QuerySpecification;

/// Static lookup from module ids and mode names to handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleRouter;

impl ModuleRouter {
    /// Resolves a catalog module id (1..7).
    pub fn route(&self, id: i64) -> Result<QueryModule> {
        u8::try_from(id)
            .ok()
            .and_then(QueryModule::from_id)
            .ok_or(QueryError::UnknownModule { id })
    }

    /// Pairs `module` with the mode named `mode`, rejecting modes the module
    /// does not declare.
    pub fn select_mode(&self, module: QueryModule, mode: &str) -> Result<ModuleQuery> {
        ModuleQuery::parse(module, mode).ok_or_else(|| QueryError::UnsupportedMode {
            module,
            mode: mode.trim().to_string(),
        })
    }

    /// Builds the retrieval for `spec` with the handler of its module.
    pub fn build(&self, spec: &QuerySpecification, ctx: &HandlerContext<'_>) -> Result<Retrieval> {
        match spec.query {
            ModuleQuery::Laboratory(mode) => LaboratoryHandler.build(mode, spec, ctx),
            ModuleQuery::Medications(mode) => MedicationsHandler.build(mode, spec, ctx),
            ModuleQuery::Procedures(mode) => ProceduresHandler.build(mode, spec, ctx),
            ModuleQuery::AdverseEvents(mode) => AdverseEventsHandler.build(mode, spec, ctx),
            ModuleQuery::VitalSigns(mode) => VitalSignsHandler.build(mode, spec, ctx),
            ModuleQuery::Disposition(mode) => DispositionHandler.build(mode, spec, ctx),
            ModuleQuery::DosingExposure(mode) => DosingExposureHandler.build(mode, spec, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_route_known_ids() {
        assert_eq!(ModuleRouter.route(1).unwrap(), QueryModule::Laboratory);
        assert_eq!(ModuleRouter.route(7).unwrap(), QueryModule::DosingExposure);
    }

    #[test]
    fn test_route_unknown_id_is_unsupported() {
        for id in [0, 8, -1, 300] {
            let err = ModuleRouter.route(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        }
    }

    #[test]
    fn test_select_mode_rejects_undeclared() {
        let err = ModuleRouter
            .select_mode(QueryModule::VitalSigns, "prior_first")
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedMode { module: QueryModule::VitalSigns, ref mode } if mode == "prior_first"
        ));
    }
}
