//! In-memory record tables for tablekit.
//!
//! This crate provides [`InMemoryTable`], an implementation of the
//! `RecordTable` trait that keeps its records in insertion order and serializes
//! all access through a single worker thread per table. No lock is exposed:
//! callers submit operations and receive results asynchronously, either by
//! awaiting a [`Completion`] or through a callback run on the table's response
//! context.
//!
//! # Features
//!
//! - **Serialized access** - Operations on a table run one at a time, in submission order
//! - **Runtime agnostic** - Completions are plain futures; no async runtime is required
//! - **Predicate queries** - Count, find and delete records with any `Fn(&T) -> bool`
//! - **Pluggable delivery** - Completions run on a serial response thread, inline, or on
//!   a caller-provided response context
//!
//! # Quick Start
//!
//! ```ignore
//! use tablekit::{record::Record, memory::InMemoryTable};
//!
//! #[derive(Debug, Clone)]
//! pub struct Contact {
//!     pub name: String,
//! }
//!
//! impl Record for Contact {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let contacts = InMemoryTable::<Contact>::new()?;
//!
//!     contacts.insert(Contact { name: "Alice".to_string() }).await?;
//!
//!     let alice = contacts
//!         .find_first_matching(|c: &Contact| c.name == "Alice")
//!         .await?;
//!     assert!(alice.is_some());
//!
//!     contacts.shutdown().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as tablekit_memory;

pub mod config;
mod operation;
pub mod store;
pub mod table;

pub use config::{ResponseMode, TableConfig};
pub use store::RecordStore;
pub use table::{Completion, InMemoryTable, InMemoryTableBuilder};
