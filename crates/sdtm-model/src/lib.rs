//! Shared vocabulary for SDTM standard queries.
//!
//! - **module**: the seven query modules and the relationship modes each declares
//! - **retrieval**: read-only retrieval plans and their SQL rendering
//! - **rowset**: tabular read results
//! - **access**: the [`DatasetAccess`] seam implemented by dataset backends
//! - **datetime**: ISO 8601 date helpers for timing variables

pub mod access;
pub mod datetime;
pub mod module;
pub mod retrieval;
pub mod rowset;

pub use access::{DataAccessError, DatasetAccess};
pub use datetime::{extract_date, format_date, record_date};
pub use module::{
    DispositionMode, ExposureMode, MedicationMode, ModuleQuery, ProcedureMode, QueryModule,
    TemporalMode,
};
pub use retrieval::{
    ColumnExpr, OrderKey, Predicate, RankRule, Ranking, Retrieval, SUBJECT_COLUMN, SelectItem,
};
pub use rowset::{CellValue, RowSet};
