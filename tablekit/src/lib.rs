//! Generic in-process record tables with serialized asynchronous access.
//!
//! This crate is the primary entry point for users of tablekit. It re-exports
//! the core traits from `tablekit-core` and the in-memory table from
//! `tablekit-memory`.
//!
//! A table stores records of a single type in insertion order. Every read and
//! write is funneled through one worker per table, so operations execute one at
//! a time in the order they were submitted and no caller ever sees a partial
//! effect. Results come back asynchronously and are snapshots: mutating them
//! does not touch the table.
//!
//! # Quick Start
//!
//! ```ignore
//! use tablekit::{prelude::*, memory::InMemoryTable};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct Contact {
//!     pub name: String,
//!     pub favorite: bool,
//! }
//!
//! impl Record for Contact {
//!     fn table_name() -> &'static str { "contacts" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> TableResult<()> {
//!     let contacts = InMemoryTable::<Contact>::new()?;
//!
//!     contacts.insert(Contact { name: "Alice".into(), favorite: true });
//!     contacts.insert(Contact { name: "Bob".into(), favorite: false });
//!
//!     // Operations run in submission order, so both inserts are visible here.
//!     let favorites = contacts.find_all_matching(|c: &Contact| c.favorite).await?;
//!     assert_eq!(favorites.len(), 1);
//!
//!     let removed = contacts.delete_first_matching(|c: &Contact| c.name == "Bob").await?;
//!     assert!(removed);
//!
//!     contacts.shutdown().await
//! }
//! ```
//!
//! # Callbacks
//!
//! Every operation also has a callback form, for callers that are not async.
//! The callback runs exactly once on the table's response context:
//!
//! ```ignore
//! contacts.count_with(|count| println!("{count} contacts"))?;
//! ```
//!
//! # Response Contexts
//!
//! Completions run on a dedicated serial response thread by default. Use
//! [`InlineResponder`](context::InlineResponder) to run them on the table's
//! worker, [`TokioResponder`](context::TokioResponder) (with the `tokio`
//! feature) to spawn them onto a runtime, or implement
//! [`ResponseContext`](context::ResponseContext) for an application event loop.
//!
//! # Backends
//!
//! - [`memory`] - The in-memory table
//!
//! Other stores can implement [`RecordTable`](backend::RecordTable) to be used
//! wherever an in-memory table is expected.

pub mod prelude;

pub use tablekit_core::{backend, context, error, predicate, record};

// Re-exported for implementors of `RecordTable`.
pub use async_trait::async_trait;

/// In-memory table implementation.
pub mod memory {
    pub use tablekit_memory::{
        Completion, InMemoryTable, InMemoryTableBuilder, RecordStore, ResponseMode, TableConfig,
    };
}
