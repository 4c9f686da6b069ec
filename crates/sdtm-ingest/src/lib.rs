//! Study dataset loading and in-memory read access.
//!
//! - **discovery**: matching CSV exports in a study folder to SDTM domains
//! - **csv**: reading one export into a Polars DataFrame
//! - **store**: [`StudyStore`], the per-project dataset backend
//! - **executor**: evaluation of retrieval plans as Polars lazy queries

pub mod csv;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod polars_utils;
pub mod store;

pub use csv::{read_dataset, type_numeric_columns};
pub use discovery::{STUDY_DOMAINS, discover_domain_files, list_csv_files};
pub use error::{IngestError, Result};
pub use executor::execute;
pub use polars_utils::{any_to_cell, find_column};
pub use store::StudyStore;
