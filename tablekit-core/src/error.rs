//! Error types and result types for table operations.
//!
//! Operations against the store itself never fail: "not found" and "nothing to
//! delete" are ordinary results. The errors here describe the plumbing around the
//! store, i.e. a table whose worker is gone or an operation that never got to run.
//! Use [`TableResult<T>`] as the return type for fallible calls.

use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The table's operation worker has stopped and accepts no more operations.
    /// The argument is the table name.
    #[error("Table {0} is closed")]
    Closed(String),
    /// An accepted operation was discarded before it produced a result.
    /// The argument is the table name.
    #[error("Operation on table {0} was dropped before completing")]
    OperationDropped(String),
    /// A worker or responder thread could not be started.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for table operations.
pub type TableResult<T> = Result<T, TableError>;

impl From<IoError> for TableError {
    fn from(err: IoError) -> Self {
        TableError::Initialization(err.to_string())
    }
}
