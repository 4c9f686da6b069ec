//! The query entry point.

use sdtm_model::DatasetAccess;

use crate::category::{CandidateSource, CategoricalFilterResolver, CategoryFilterOutcome};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::handlers::HandlerContext;
use crate::request::QueryRequest;
use crate::result::{QueryResult, ResultFormatter};
use crate::router::ModuleRouter;
use crate::specification::QuerySpecification;

/// Resolves standard queries against one project's datasets.
///
/// The engine holds no per-request state; one instance may serve requests
/// from several threads.
#[derive(Debug, Clone)]
pub struct QueryEngine<A> {
    access: A,
    config: EngineConfig,
}

impl<A: DatasetAccess> QueryEngine<A> {
    pub fn new(access: A, config: EngineConfig) -> Self {
        Self { access, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    /// Builds and executes the retrieval for `spec`.
    pub fn run(&self, spec: &QuerySpecification) -> Result<QueryResult> {
        let schema = self.config.schema();
        let fallbacks = self.config.fallback_policy();
        let ctx = HandlerContext {
            access: &self.access,
            schema: &schema,
            fallbacks: &fallbacks,
            reference_date: self.config.reference_date(),
        };
        tracing::debug!(
            module = spec.query.module().as_str(),
            mode = spec.query.mode_name(),
            "resolving query"
        );
        tracing::trace!(subject = %spec.subject, "query subject");

        let retrieval = ModuleRouter.build(spec, &ctx)?;
        let result = ResultFormatter::new(&self.access).execute(&retrieval)?;
        tracing::debug!(
            rows = result.result.rows().len(),
            no_data = result.result.is_no_data(),
            "query resolved"
        );
        Ok(result)
    }

    /// Validates a wire request and runs it.
    pub fn run_request(&self, request: &QueryRequest) -> Result<QueryResult> {
        let spec = QuerySpecification::try_from(request)?;
        self.run(&spec)
    }

    /// Values a placeholder may take for `subject`, read from `table.field`.
    ///
    /// `category` restricts rows to a category column and the values already
    /// chosen for it.
    pub fn candidate_values(
        &self,
        subject: &str,
        table: &str,
        field: &str,
        category: Option<(&str, &[String])>,
    ) -> Result<CategoryFilterOutcome> {
        let schema = self.config.schema();
        let fallbacks = self.config.fallback_policy();
        let source = CandidateSource {
            schema: &schema,
            subject,
            table,
            field,
            category,
        };
        CategoricalFilterResolver::new(&fallbacks).candidate_values(&self.access, &source)
    }
}
