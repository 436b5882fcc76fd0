//! Core traits and types for tablekit record tables.
//!
//! A table stores records of a single type in insertion order and funnels every
//! read and write through one serialized worker, delivering results
//! asynchronously. This crate holds the pieces shared by all table
//! implementations:
//!
//! - **Records** ([`record`]) - The capability a stored type must provide
//! - **Predicates** ([`predicate`]) - Boolean tests used to select records
//! - **Table abstraction** ([`backend`]) - The async trait tables implement
//! - **Response contexts** ([`context`]) - Where completions are delivered
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use tablekit::record::Record;
//!
//! #[derive(Debug, Clone)]
//! pub struct Contact {
//!     pub name: String,
//! }
//!
//! impl Record for Contact {
//!     fn table_name() -> &'static str {
//!         "contacts"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as tablekit_core;

pub mod backend;
pub mod context;
pub mod error;
pub mod predicate;
pub mod record;
