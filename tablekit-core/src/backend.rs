//! Table abstraction shared by every record table implementation.
//!
//! The [`RecordTable`] trait is the seam between code that stores records and
//! the thing storing them. The in-memory table in `tablekit-memory` implements
//! it, and a durable store can implement it too in order to stand in for, or
//! sit behind, an in-memory table.
//!
//! # Ordering
//!
//! Implementations must execute the operations submitted through one table
//! handle in submission order, each one observing the full effect of the
//! operations before it.
//!
//! # Errors
//!
//! Operations against the records themselves are total: an empty table yields
//! `0`, an empty `Vec`, `None` or `false`. Errors only report that the table
//! could not run the operation at all.
//!
//! # Example
//!
//! ```ignore
//! use tablekit::{backend::RecordTable, predicate::Selection};
//!
//! async fn purge_inactive<B: RecordTable<Account>>(table: &B) -> TableResult<usize> {
//!     table.delete_all_matching(Selection::new(|a: &Account| !a.active)).await
//! }
//! ```

use async_trait::async_trait;

use crate::{error::TableResult, predicate::Selection, record::Record};

/// Abstract interface for tables holding records of type `T`.
#[async_trait]
pub trait RecordTable<T: Record>: Send + Sync {
    /// Returns the number of records in the table.
    async fn count(&self) -> TableResult<usize>;

    /// Returns the number of records matching `predicate`.
    ///
    /// Every record is tested; there is no short-circuit.
    async fn count_matching(&self, predicate: Selection<T>) -> TableResult<usize>;

    /// Returns a snapshot of every record, in table order.
    async fn find_all(&self) -> TableResult<Vec<T>>;

    /// Returns a snapshot of the records matching `predicate`, in table order.
    async fn find_all_matching(&self, predicate: Selection<T>) -> TableResult<Vec<T>>;

    /// Returns the first record, in table order, matching `predicate`.
    async fn find_first_matching(&self, predicate: Selection<T>) -> TableResult<Option<T>>;

    /// Appends a record to the end of the table.
    async fn insert(&self, record: T) -> TableResult<()>;

    /// Appends several records, in order, as a single operation.
    ///
    /// Returns the number of records appended.
    async fn insert_all(&self, records: Vec<T>) -> TableResult<usize>;

    /// Removes every record and returns how many were removed.
    async fn delete_all(&self) -> TableResult<usize>;

    /// Removes every record matching `predicate` and returns how many were removed.
    ///
    /// The remaining records keep their relative order.
    async fn delete_all_matching(&self, predicate: Selection<T>) -> TableResult<usize>;

    /// Removes the first record matching `predicate`.
    ///
    /// Returns `true` if a record was removed.
    async fn delete_first_matching(&self, predicate: Selection<T>) -> TableResult<bool>;
}

/// Factory trait for constructing table instances.
#[async_trait]
pub trait RecordTableBuilder<T: Record>: Send {
    /// The table type this builder produces.
    type Table: RecordTable<T>;

    /// Builds and returns a new table.
    async fn build(self) -> TableResult<Self::Table>;
}
