//! The ordered record sequence behind an in-memory table.
//!
//! [`RecordStore`] is plain, single-threaded data: it is owned by a table's
//! worker and never shared. Every scan walks the records front to back, so
//! indices computed during an operation refer to the store as it was when that
//! operation started.

use tablekit_core::predicate::Predicate;

/// An insertion-ordered sequence of records with predicate-based scans.
#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    records: Vec<T>,
}

impl<T> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Creates an empty store with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts the records matching `predicate`, testing every record.
    pub fn count_matching<P>(&self, predicate: &P) -> usize
    where
        P: Predicate<T> + ?Sized,
    {
        self.records
            .iter()
            .filter(|record| predicate.evaluate(record))
            .count()
    }

    /// Appends a record.
    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    /// Appends records in iteration order, returning how many were appended.
    pub fn extend(&mut self, records: impl IntoIterator<Item = T>) -> usize {
        let before = self.records.len();
        self.records.extend(records);

        self.records.len() - before
    }

    /// Removes every record, returning how many were removed.
    ///
    /// The backing allocation is released.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records = Vec::new();

        removed
    }

    /// Removes every record matching `predicate`, returning how many were removed.
    ///
    /// The matching indices are collected in a single scan against the store as
    /// it is before any removal. They are then removed in ascending order; the
    /// k-th removal targets `indices[k] - k` because each earlier removal has
    /// shifted the remaining records down by one.
    pub fn delete_matching<P>(&mut self, predicate: &P) -> usize
    where
        P: Predicate<T> + ?Sized,
    {
        let indices = self.matching_indices(predicate);

        for (removed, index) in indices.iter().enumerate() {
            self.records.remove(index - removed);
        }

        indices.len()
    }

    /// Removes the first record matching `predicate`.
    ///
    /// Returns `true` if a record was removed.
    pub fn delete_first_matching<P>(&mut self, predicate: &P) -> bool
    where
        P: Predicate<T> + ?Sized,
    {
        match self.first_matching_index(predicate) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    fn matching_indices<P>(&self, predicate: &P) -> Vec<usize>
    where
        P: Predicate<T> + ?Sized,
    {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| predicate.evaluate(record))
            .map(|(index, _)| index)
            .collect()
    }

    fn first_matching_index<P>(&self, predicate: &P) -> Option<usize>
    where
        P: Predicate<T> + ?Sized,
    {
        self.records
            .iter()
            .position(|record| predicate.evaluate(record))
    }
}

impl<T: Clone> RecordStore<T> {
    /// Returns a copy of every record, in store order.
    pub fn snapshot(&self) -> Vec<T> {
        self.records.clone()
    }

    /// Returns a copy of the records matching `predicate`, in store order.
    pub fn snapshot_matching<P>(&self, predicate: &P) -> Vec<T>
    where
        P: Predicate<T> + ?Sized,
    {
        self.records
            .iter()
            .filter(|record| predicate.evaluate(record))
            .cloned()
            .collect()
    }

    /// Returns a copy of the first record matching `predicate`.
    pub fn first_matching<P>(&self, predicate: &P) -> Option<T>
    where
        P: Predicate<T> + ?Sized,
    {
        self.records
            .iter()
            .find(|record| predicate.evaluate(record))
            .cloned()
    }
}
