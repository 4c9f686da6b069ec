//! Error types for standard-query resolution.

use std::path::PathBuf;

use sdtm_model::{DataAccessError, QueryModule};
use thiserror::Error;

/// Errors raised while resolving or executing a standard query.
///
/// An empty result is not an error; it is reported as
/// [`QueryOutcome::NoData`](crate::QueryOutcome::NoData).
#[derive(Debug, Error)]
pub enum QueryError {
    /// A field the selected mode depends on was not supplied.
    #[error("{parameter} is required for '{mode}' queries")]
    MissingParameter {
        parameter: &'static str,
        mode: &'static str,
    },

    /// The module identifier matches none of the seven query modules.
    #[error("unsupported module type {id}")]
    UnknownModule { id: i64 },

    /// The module does not declare the requested relationship mode.
    #[error("{module} does not support '{mode}' (supported: {})", .module.mode_names().join(", "))]
    UnsupportedMode { module: QueryModule, mode: String },

    /// A secondary anchor could not be resolved from the subject's records.
    #[error("no {what} found for subject {subject}")]
    NotFound { what: &'static str, subject: String },

    /// A supplied value could not be interpreted.
    #[error("invalid {parameter} value '{value}'")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
    },

    /// The dataset backend failed.
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

/// Coarse classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingParameter,
    UnsupportedOperation,
    NotFound,
    InvalidParameter,
    DataAccess,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::MissingParameter { .. } => ErrorKind::MissingParameter,
            QueryError::UnknownModule { .. } | QueryError::UnsupportedMode { .. } => {
                ErrorKind::UnsupportedOperation
            }
            QueryError::NotFound { .. } => ErrorKind::NotFound,
            QueryError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            QueryError::DataAccess(_) => ErrorKind::DataAccess,
        }
    }
}

/// Errors raised while loading an engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
