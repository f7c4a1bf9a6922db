//! Single-column equality filter.

use crate::record::Record;

/// A `(column, value)` equality filter.
///
/// Matching compares string representations: the record's field rendered
/// as text must equal `value` exactly, whatever the column's declared type.
/// `age = 30` matches an `int` 30 and `active = true` matches a `bool`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    column: String,
    value: String,
}

impl Predicate {
    /// Creates a predicate.
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Returns the filtered column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the expected string representation.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if the record's field equals the expected value.
    ///
    /// A record without the column never matches.
    pub fn matches(&self, record: &Record) -> bool {
        record
            .rendered(&self.column)
            .is_some_and(|rendered| rendered == self.value)
    }
}
