//! The dataset-access seam.

use thiserror::Error;

use crate::retrieval::Retrieval;
use crate::rowset::RowSet;

/// Failure reported by a dataset backend.
///
/// An empty result is not an error; backends return an empty [`RowSet`].
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("unknown dataset schema '{schema}'")]
    UnknownSchema { schema: String },

    #[error("dataset {schema}.{table} not found")]
    TableNotFound { schema: String, table: String },

    #[error("column '{column}' not found in dataset {table}")]
    ColumnNotFound { table: String, column: String },

    #[error("dataset backend error: {message}")]
    Backend { message: String },
}

impl DataAccessError {
    pub fn backend(message: impl Into<String>) -> Self {
        DataAccessError::Backend {
            message: message.into(),
        }
    }
}

/// Read-only access to a project's clinical datasets.
///
/// Implementations must never modify stored data. Calls may block on I/O;
/// timeouts and retries belong to the implementation or its caller.
pub trait DatasetAccess: Send + Sync {
    /// Executes `retrieval` and returns its rows with output column names.
    fn execute_read_only(&self, retrieval: &Retrieval) -> Result<RowSet, DataAccessError>;
}

impl<T: DatasetAccess + ?Sized> DatasetAccess for &T {
    fn execute_read_only(&self, retrieval: &Retrieval) -> Result<RowSet, DataAccessError> {
        (**self).execute_read_only(retrieval)
    }
}

impl<T: DatasetAccess + ?Sized> DatasetAccess for std::sync::Arc<T> {
    fn execute_read_only(&self, retrieval: &Retrieval) -> Result<RowSet, DataAccessError> {
        (**self).execute_read_only(retrieval)
    }
}
