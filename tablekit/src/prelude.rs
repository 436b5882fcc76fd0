//! Convenient re-exports of commonly used types from tablekit.
//!
//! ```ignore
//! use tablekit::prelude::*;
//! ```

pub use tablekit_core::{
    backend::{RecordTable, RecordTableBuilder},
    context::{InlineResponder, Job, ResponseContext, SerialResponder},
    error::{TableError, TableResult},
    predicate::{Predicate, Selection},
    record::Record,
};
pub use tablekit_memory::{Completion, InMemoryTable, InMemoryTableBuilder, ResponseMode, TableConfig};

#[cfg(feature = "tokio")]
pub use tablekit_core::context::TokioResponder;
