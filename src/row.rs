//! Materialized result rows and the row/entity mapping seam.

use crate::values::{ColumnSet, Value};
use crate::{Error, Result};

/// One row of a query result, detached from the driver's cursor.
///
/// Holds the row's columns in result order. Lookups are by column name; the
/// typed accessors return `None` when the column is absent or holds a
/// different type.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub(crate) fn new(entries: Vec<(String, Value)>) -> Self {
        Self { entries }
    }

    /// Returns the value of `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Returns `column` as text.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns `column` as an integer.
    #[must_use]
    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.get(column) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns `column` as a float, widening stored integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn real(&self, column: &str) -> Option<f64> {
        match self.get(column) {
            Some(Value::Real(r)) => Some(*r),
            Some(Value::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns `column` as a boolean.
    ///
    /// `SQLite` stores booleans as integers, so a stored 0/1 reads back as
    /// `false`/`true` here.
    #[must_use]
    pub fn boolean(&self, column: &str) -> Option<bool> {
        match self.get(column) {
            Some(Value::Boolean(b)) => Some(*b),
            Some(Value::Integer(i)) => Some(*i != 0),
            _ => None,
        }
    }

    /// Column names in result order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a row with no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds an [`Error::Execution`] for a column the mapper expected but
    /// the row does not carry. Convenience for [`RowMapper`] impls.
    #[must_use]
    pub fn missing(&self, column: &str) -> Error {
        Error::Execution {
            operation: "map_row".to_string(),
            cause: format!("missing or mistyped column '{column}'"),
        }
    }
}

/// Translates rows into domain records and records back into column sets.
///
/// The write direction feeds [`crate::sql::build_insert`] and
/// [`crate::sql::build_update`]; the read direction consumes the rows
/// returned by [`crate::Database::query`].
pub trait RowMapper {
    /// The domain record this mapper handles.
    type Entity;

    /// Builds a record from a result row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the row lacks a column the record
    /// requires.
    fn from_row(&self, row: &Row) -> Result<Self::Entity>;

    /// Stages a record's fields as a [`ColumnSet`] for INSERT/UPDATE.
    fn to_values(&self, entity: &Self::Entity) -> ColumnSet;
}
