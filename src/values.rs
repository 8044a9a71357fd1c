//! Scalar values and the ordered column/value staging container.
//!
//! A [`ColumnSet`] stages one row's worth of data for an INSERT or UPDATE.
//! It preserves insertion order because that order determines the positional
//! correspondence between the generated column list and value list; breaking
//! it would corrupt data silently.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

/// A tagged scalar value.
///
/// These are the only types a [`ColumnSet`] accepts, and the only types a
/// [`Row`](crate::Row) hands back. Booleans are stored as integers by
/// `SQLite`; they read back as [`Value::Integer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A 64-bit integer.
    Integer(i64),
    /// A 64-bit float.
    Real(f64),
    /// A text string.
    Text(String),
    /// A binary blob.
    Blob(Vec<u8>),
    /// A boolean, bound as 1 or 0.
    Boolean(bool),
}

impl Value {
    /// Converts a driver-level value into a [`Value`].
    pub(crate) fn from_sql(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Self::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*r)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Self::Boolean(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
        })
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

/// An ordered mapping from column name to [`Value`].
///
/// Constructed fresh per operation, consumed once by the statement builders,
/// then discarded. Re-putting an existing column replaces its value in place
/// without changing the column's position.
///
/// # Examples
///
/// ```
/// use openlite::ColumnSet;
///
/// let values = ColumnSet::new()
///     .with("name", "Tyler")
///     .with("age", 27)
///     .with("active", true);
/// assert_eq!(values.len(), 3);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColumnSet {
    entries: Vec<(String, Value)>,
}

impl ColumnSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, replacing the value in place if the column exists.
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| *c == column) {
            entry.1 = value;
        } else {
            self.entries.push((column, value));
        }
        self
    }

    /// Builder-style [`put`](Self::put).
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(column, value);
        self
    }

    /// Returns the value stored for `column`, if any.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Number of columns in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no columns have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Column/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}
