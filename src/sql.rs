//! SQL statement construction.
//!
//! Pure string and parameter assembly; nothing here touches the database.
//! Builders emit `?N` placeholders for values and carry the values in a
//! separate, positionally matched vector, so execution always binds
//! parameters instead of interpolating text. Identifiers are wrapped in
//! `[...]`. Predicate, order, and limit arguments are opaque pre-formatted
//! fragments (e.g. `[id]=3`, `[name] DESC`, `10`); composing them is the
//! caller's responsibility, and absent clauses are omitted entirely rather
//! than emitted empty.
//!
//! A [`Statement`] also renders as the equivalent literal SQL text through
//! [`Display`](std::fmt::Display), for logging and tests. The rendering
//! quotes strings (doubling embedded quotes) and prints numerics and
//! booleans bare; it is never what gets executed.

use crate::values::{ColumnSet, Value};
use std::fmt;
use std::fmt::Write as _;

/// A built SQL statement: placeholder text plus positionally matched values.
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    literal: String,
    params: Vec<Value>,
}

impl Statement {
    /// The SQL text with `?N` placeholders, as handed to the driver.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The values bound to the placeholders, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Renders a value as a SQL literal for the display form of a statement.
///
/// Strings are single-quoted with embedded quotes doubled. Blobs render as
/// `X'..'` hex literals.
fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(b) => {
            let mut out = String::with_capacity(b.len() * 2 + 3);
            out.push_str("X'");
            for byte in b {
                let _ = write!(out, "{byte:02X}");
            }
            out.push('\'');
            out
        },
    }
}

/// Appends ` WHERE ..`, ` ORDER BY ..`, and ` LIMIT ..` to both forms of a
/// statement, skipping absent clauses.
fn push_tail(
    sql: &mut String,
    literal: &mut String,
    predicate: Option<&str>,
    order: Option<&str>,
    limit: Option<&str>,
) {
    if let Some(predicate) = predicate {
        let _ = write!(sql, " WHERE {predicate}");
        let _ = write!(literal, " WHERE {predicate}");
    }
    if let Some(order) = order {
        let _ = write!(sql, " ORDER BY {order}");
        let _ = write!(literal, " ORDER BY {order}");
    }
    if let Some(limit) = limit {
        let _ = write!(sql, " LIMIT {limit}");
        let _ = write!(literal, " LIMIT {limit}");
    }
    sql.push(';');
    literal.push(';');
}

/// Builds a SELECT statement.
///
/// With `columns` given the projection lists `[c1],[c2],...`, otherwise
/// `SELECT *`. Carries no parameters; the predicate is an opaque fragment.
///
/// The display form wraps a column subset in parentheses,
/// `SELECT ([c1],[c2]) FROM ..`, which is the documented text of this layer;
/// the executed form drops them because `SQLite` parses a parenthesized
/// column list as a misused row value.
///
/// # Examples
///
/// ```
/// use openlite::sql::build_select;
///
/// let stmt = build_select("users", None, None, None, None);
/// assert_eq!(stmt.sql(), "SELECT * FROM [users];");
/// ```
#[must_use]
pub fn build_select(
    table: &str,
    columns: Option<&[&str]>,
    predicate: Option<&str>,
    order: Option<&str>,
    limit: Option<&str>,
) -> Statement {
    let mut sql = String::from("SELECT ");
    let mut literal = String::from("SELECT ");
    if let Some(columns) = columns {
        literal.push('(');
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                sql.push(',');
                literal.push(',');
            }
            let _ = write!(sql, "[{column}]");
            let _ = write!(literal, "[{column}]");
        }
        sql.push_str(" FROM ");
        literal.push_str(") FROM ");
    } else {
        sql.push_str("* FROM ");
        literal.push_str("* FROM ");
    }
    let _ = write!(sql, "[{table}]");
    let _ = write!(literal, "[{table}]");

    push_tail(&mut sql, &mut literal, predicate, order, limit);
    Statement {
        sql,
        literal,
        params: Vec::new(),
    }
}

/// Builds an INSERT statement from a [`ColumnSet`].
///
/// Columns and placeholders are emitted in the set's insertion order, and the
/// parameter vector matches that order positionally. An empty set yields
/// syntactically invalid SQL; that is a caller contract violation, not
/// something handled here.
#[must_use]
pub fn build_insert(table: &str, values: &ColumnSet) -> Statement {
    let mut columns = String::new();
    let mut marks = String::new();
    let mut rendered = String::new();
    let mut params = Vec::with_capacity(values.len());

    for (i, (column, value)) in values.iter().enumerate() {
        if i > 0 {
            columns.push(',');
            marks.push(',');
            rendered.push(',');
        }
        let _ = write!(columns, "[{column}]");
        let _ = write!(marks, "?{}", i + 1);
        rendered.push_str(&render(value));
        params.push(value.clone());
    }

    Statement {
        sql: format!("INSERT INTO [{table}] ({columns}) VALUES ({marks});"),
        literal: format!("INSERT INTO [{table}] ({columns}) VALUES ({rendered});"),
        params,
    }
}

/// Builds an UPDATE statement from a [`ColumnSet`].
///
/// `[column]=?N` pairs are comma-joined in the set's insertion order. The
/// WHERE clause is appended only when a predicate is given; without one the
/// statement updates every row.
#[must_use]
pub fn build_update(table: &str, values: &ColumnSet, predicate: Option<&str>) -> Statement {
    let mut pairs = String::new();
    let mut rendered = String::new();
    let mut params = Vec::with_capacity(values.len());

    for (i, (column, value)) in values.iter().enumerate() {
        if i > 0 {
            pairs.push(',');
            rendered.push(',');
        }
        let _ = write!(pairs, "[{column}]=?{}", i + 1);
        let _ = write!(rendered, "[{column}]={}", render(value));
        params.push(value.clone());
    }

    let mut sql = format!("UPDATE [{table}] SET {pairs}");
    let mut literal = format!("UPDATE [{table}] SET {rendered}");
    push_tail(&mut sql, &mut literal, predicate, None, None);
    Statement {
        sql,
        literal,
        params,
    }
}

/// Builds a DELETE statement.
///
/// Without a predicate this deletes every row in the table; callers must
/// treat the missing-predicate form as a dangerous default.
#[must_use]
pub fn build_delete(table: &str, predicate: Option<&str>) -> Statement {
    let mut sql = format!("DELETE FROM [{table}]");
    let mut literal = sql.clone();
    push_tail(&mut sql, &mut literal, predicate, None, None);
    Statement {
        sql,
        literal,
        params: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_defaults() {
        let stmt = build_select("users", None, None, None, None);
        assert_eq!(stmt.sql(), "SELECT * FROM [users];");
        assert_eq!(stmt.to_string(), "SELECT * FROM [users];");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_select_with_all_clauses() {
        let stmt = build_select(
            "users",
            Some(&["name", "username", "password"]),
            Some("[id]=3"),
            Some("[name] DESC"),
            Some("10"),
        );
        assert_eq!(
            stmt.to_string(),
            "SELECT ([name],[username],[password]) FROM [users] WHERE [id]=3 ORDER BY [name] DESC LIMIT 10;"
        );
        // The executed form lists columns bare; SQLite rejects the
        // parenthesized spelling as a row value.
        assert_eq!(
            stmt.sql(),
            "SELECT [name],[username],[password] FROM [users] WHERE [id]=3 ORDER BY [name] DESC LIMIT 10;"
        );
    }

    #[test]
    fn test_select_omits_absent_clauses() {
        let stmt = build_select("users", None, Some("[id]=3"), None, None);
        assert_eq!(stmt.sql(), "SELECT * FROM [users] WHERE [id]=3;");

        let stmt = build_select("users", None, None, Some("[name] ASC"), None);
        assert_eq!(stmt.sql(), "SELECT * FROM [users] ORDER BY [name] ASC;");

        let stmt = build_select("users", None, None, None, Some("5"));
        assert_eq!(stmt.sql(), "SELECT * FROM [users] LIMIT 5;");
    }

    #[test]
    fn test_insert_literal_rendering() {
        let values = ColumnSet::new()
            .with("name", "Tyler")
            .with("username", "tyler123")
            .with("password", "tyler123");
        let stmt = build_insert("users", &values);
        assert_eq!(
            stmt.to_string(),
            "INSERT INTO [users] ([name],[username],[password]) VALUES ('Tyler','tyler123','tyler123');"
        );
    }

    #[test]
    fn test_insert_placeholders_match_params() {
        let values = ColumnSet::new()
            .with("name", "Tyler")
            .with("age", 27)
            .with("score", 12.123)
            .with("active", true);
        let stmt = build_insert("users", &values);
        assert_eq!(
            stmt.sql(),
            "INSERT INTO [users] ([name],[age],[score],[active]) VALUES (?1,?2,?3,?4);"
        );
        assert_eq!(
            stmt.params(),
            &[
                Value::Text("Tyler".to_string()),
                Value::Integer(27),
                Value::Real(12.123),
                Value::Boolean(true),
            ]
        );
        assert_eq!(
            stmt.to_string(),
            "INSERT INTO [users] ([name],[age],[score],[active]) VALUES ('Tyler',27,12.123,true);"
        );
    }

    #[test]
    fn test_insert_column_order_follows_insertion_order() {
        let values = ColumnSet::new().with("z", 1).with("a", 2).with("m", 3);
        let stmt = build_insert("t", &values);
        assert_eq!(stmt.sql(), "INSERT INTO [t] ([z],[a],[m]) VALUES (?1,?2,?3);");
        assert_eq!(
            stmt.params(),
            &[Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn test_update_with_predicate() {
        let values = ColumnSet::new()
            .with("name", "Tyler")
            .with("username", "tyler123");
        let stmt = build_update("users", &values, Some("[id]=3"));
        assert_eq!(
            stmt.to_string(),
            "UPDATE [users] SET [name]='Tyler',[username]='tyler123' WHERE [id]=3;"
        );
        assert_eq!(
            stmt.sql(),
            "UPDATE [users] SET [name]=?1,[username]=?2 WHERE [id]=3;"
        );
    }

    #[test]
    fn test_update_without_predicate() {
        let values = ColumnSet::new().with("active", false);
        let stmt = build_update("users", &values, None);
        assert_eq!(stmt.sql(), "UPDATE [users] SET [active]=?1;");
    }

    #[test]
    fn test_delete_with_and_without_predicate() {
        let stmt = build_delete("users", Some("[id]=3"));
        assert_eq!(stmt.to_string(), "DELETE FROM [users] WHERE [id]=3;");

        // No predicate means delete all rows.
        let stmt = build_delete("users", None);
        assert_eq!(stmt.sql(), "DELETE FROM [users];");
    }

    #[test]
    fn test_embedded_quotes_doubled_in_rendering() {
        let values = ColumnSet::new().with("name", "O'Brien");
        let stmt = build_insert("users", &values);
        assert_eq!(
            stmt.to_string(),
            "INSERT INTO [users] ([name]) VALUES ('O''Brien');"
        );
        // The bound parameter keeps the original text.
        assert_eq!(stmt.params(), &[Value::Text("O'Brien".to_string())]);
    }

    #[test]
    fn test_null_and_blob_rendering() {
        let values = ColumnSet::new()
            .with("note", Value::Null)
            .with("raw", vec![0xAB_u8, 0x01]);
        let stmt = build_insert("t", &values);
        assert_eq!(
            stmt.to_string(),
            "INSERT INTO [t] ([note],[raw]) VALUES (NULL,X'AB01');"
        );
    }
}
