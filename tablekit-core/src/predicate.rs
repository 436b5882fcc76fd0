//! Predicates for selecting records in a table.
//!
//! A predicate is a pure boolean test over a single record. Any closure of the
//! form `Fn(&T) -> bool` is a predicate, which covers most call sites:
//!
//! ```ignore
//! table.find_all_matching(|contact: &Contact| contact.email.ends_with("@example.com"));
//! ```
//!
//! When a predicate has to be stored, shared or composed, wrap it in a
//! [`Selection`], which is cheap to clone and supports logical combinators:
//!
//! ```ignore
//! use tablekit::predicate::Selection;
//!
//! let staff = Selection::new(|c: &Contact| c.email.ends_with("@example.com"));
//! let named_bob = Selection::new(|c: &Contact| c.name == "Bob");
//! let selection = staff.and(named_bob.not());
//! ```

use std::{fmt, sync::Arc};

/// A pure boolean test over a record.
///
/// Tables evaluate a predicate at most once per candidate record per operation,
/// always on the table's worker. Implementations must not have side effects the
/// caller relies on, and a panic inside [`evaluate`](Predicate::evaluate) is not
/// contained by the table.
pub trait Predicate<T>: Send + Sync + 'static {
    /// Returns `true` if the record is selected.
    fn evaluate(&self, record: &T) -> bool;
}

impl<T, F> Predicate<T> for F
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn evaluate(&self, record: &T) -> bool {
        self(record)
    }
}

/// A shareable, composable predicate.
///
/// `Selection` erases the concrete predicate type behind an `Arc`, so clones
/// share the same underlying test.
pub struct Selection<T> {
    inner: Arc<dyn Predicate<T>>,
}

impl<T: 'static> Selection<T> {
    /// Wraps any predicate.
    pub fn new<P: Predicate<T>>(predicate: P) -> Self {
        Self {
            inner: Arc::new(predicate),
        }
    }

    /// A selection matching every record.
    pub fn all() -> Self {
        Self::new(|_: &T| true)
    }

    /// A selection matching no record.
    pub fn none() -> Self {
        Self::new(|_: &T| false)
    }

    /// Matches records selected by both `self` and `other`.
    ///
    /// `other` is only evaluated when `self` matches.
    pub fn and<P: Predicate<T>>(self, other: P) -> Self {
        Self::new(move |record: &T| self.evaluate(record) && other.evaluate(record))
    }

    /// Matches records selected by either `self` or `other`.
    ///
    /// `other` is only evaluated when `self` does not match.
    pub fn or<P: Predicate<T>>(self, other: P) -> Self {
        Self::new(move |record: &T| self.evaluate(record) || other.evaluate(record))
    }

    /// Inverts this selection.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(move |record: &T| !self.evaluate(record))
    }
}

impl<T: 'static> Predicate<T> for Selection<T> {
    fn evaluate(&self, record: &T) -> bool {
        self.inner.evaluate(record)
    }
}

impl<T> Clone for Selection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection").finish_non_exhaustive()
    }
}
