//! The capability every record stored in a table must provide.

use std::any::type_name;

/// Core trait that all records stored in a table must implement.
///
/// The table imposes no identity or equality contract of its own: comparing
/// records is the business of the predicates that select them. A record only has
/// to be clonable, so reads can hand out snapshots, and sendable, so it can move
/// onto the table's worker.
///
/// # Example
///
/// ```ignore
/// use tablekit::record::Record;
///
/// #[derive(Debug, Clone)]
/// pub struct Contact {
///     pub name: String,
///     pub email: String,
/// }
///
/// impl Record for Contact {
///     fn table_name() -> &'static str {
///         "contacts"
///     }
/// }
/// ```
pub trait Record: Clone + Send + 'static {
    /// Returns the name used to label tables of this record type.
    ///
    /// Defaults to the Rust type name. Tables use it in log output and to name
    /// their worker threads unless a name is configured explicitly.
    fn table_name() -> &'static str {
        type_name::<Self>()
    }
}
