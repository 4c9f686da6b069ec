//! Temporal query resolution for SDTM standard queries.
//!
//! A query names a module, a relationship mode and a subject, plus anchor
//! dates and category selections filled in from a question template. The
//! engine resolves the anchors into a date window, builds one read-only
//! [`Retrieval`](sdtm_model::Retrieval) with the module's handler and
//! executes it through a [`DatasetAccess`](sdtm_model::DatasetAccess)
//! backend.
//!
//! ```no_run
//! use sdtm_query::{EngineConfig, QueryEngine, QueryRequest};
//! # fn demo(store: impl sdtm_model::DatasetAccess) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = QueryEngine::new(store, EngineConfig::new("P01", "sdtm"));
//! let request: QueryRequest = serde_json::from_str(
//!     r#"{"ModuleType": 4, "Usubject": "01-001", "QuestionType": "at_time",
//!         "AESTDTC": "2024-03-15"}"#,
//! )?;
//! let result = engine.run_request(&request)?;
//! println!("{}", result.retrieval_expression);
//! # Ok(())
//! # }
//! ```

pub mod anchor;
pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod request;
pub mod result;
pub mod router;
pub mod specification;
pub mod window;

pub use anchor::{AnchorDateProvider, StudyBounds};
pub use category::{
    CandidateSource, CategoricalFilterResolver, CategoryFilterOutcome, FallbackPolicy,
    NO_CATEGORIES, NO_INDICATIONS, ONGOING, split_list,
};
pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use error::{ConfigError, ErrorKind, QueryError, Result};
pub use handlers::{HandlerContext, ModuleHandler};
pub use request::QueryRequest;
pub use result::{NO_DATA_FOUND, QueryOutcome, QueryResult, ResultFormatter, ResultRow};
pub use router::ModuleRouter;
pub use specification::{AnchorEnd, QuerySpecification};
pub use window::{
    AnchorDates, DateInterval, ProximityRule, ResolvedWindow, TemporalWindowResolver, WindowMode,
};
