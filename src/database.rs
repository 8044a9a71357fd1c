//! The database handle: the only component that performs real I/O.
//!
//! A [`Database`] owns one native `SQLite` connection behind a mutex and a
//! [`RefCount`] whose drained callback closes that connection. Every public
//! operation holds a scoped reference for its whole body, so teardown cannot
//! happen under a mid-flight call; the mutex serializes driver access (the
//! native connection is not `Sync`) but nothing here coordinates writers at
//! the data level. Stronger consistency guarantees have to come from the
//! store itself.

use crate::refs::RefCount;
use crate::row::Row;
use crate::sql::{self, Statement};
use crate::values::{ColumnSet, Value};
use crate::{Error, Result};
use rusqlite::params_from_iter;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared ownership of the native connection.
///
/// `None` after the reference count has drained and teardown ran. Operations
/// that arrive later observe the `None` and fail with [`Error::Execution`].
type NativeLink = Arc<Mutex<Option<rusqlite::Connection>>>;

/// A reference-counted handle to one `SQLite` database file.
///
/// Cheap to clone; clones share the same native link and reference count.
/// The handle starts with one reference representing the handle itself, and
/// [`close`](Self::close) releases it. Mutating operations commit per call.
///
/// # Examples
///
/// ```
/// use openlite::{ColumnSet, Database};
///
/// # fn run() -> openlite::Result<()> {
/// let db = Database::open_in_memory()?;
/// db.exec_sql("CREATE TABLE [users]([id] TEXT PRIMARY KEY,[name] TEXT);")?;
/// db.insert("users", &ColumnSet::new().with("id", "u-1").with("name", "Tyler"))?;
/// let rows = db.query("users", None, None, None)?;
/// assert_eq!(rows.len(), 1);
/// db.close();
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    conn: NativeLink,
    refs: Arc<RefCount>,
}

/// Acquires the connection mutex, recovering from poison.
///
/// A poisoned mutex means an operation panicked mid-call; the connection
/// state itself is still usable, so log and continue.
fn lock(mutex: &Mutex<Option<rusqlite::Connection>>) -> MutexGuard<'_, Option<rusqlite::Connection>> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("database mutex was poisoned, recovering");
            poisoned.into_inner()
        },
    }
}

/// Applies the connection pragmas used for every handle.
///
/// WAL for concurrent readers, a busy timeout so lock contention waits
/// instead of failing outright. Failures are ignored: `journal_mode` is not
/// supported on every backing store (e.g. in-memory databases).
fn configure(conn: &rusqlite::Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
}

fn closed(operation: &str) -> Error {
    Error::Execution {
        operation: operation.to_string(),
        cause: "database handle is closed".to_string(),
    }
}

fn exec_err(operation: &str, e: &rusqlite::Error) -> Error {
    tracing::warn!(operation, error = %e, "statement failed");
    Error::Execution {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

impl Database {
    /// Opens (creating if absent) the database file at `path`.
    ///
    /// Establishes the native link, applies pragmas, and takes the initial
    /// reference representing the handle itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the native link cannot be established.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = rusqlite::Connection::open(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to open database");
            Error::Open {
                path: path.display().to_string(),
                cause: e.to_string(),
            }
        })?;
        Ok(Self::from_native(conn))
    }

    /// Opens an in-memory database. Useful for tests; no file is involved,
    /// so the schema-versioning protocol's existence check does not apply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the driver cannot allocate a database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(|e| Error::Open {
            path: ":memory:".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_native(conn))
    }

    fn from_native(conn: rusqlite::Connection) -> Self {
        configure(&conn);
        let shared: NativeLink = Arc::new(Mutex::new(Some(conn)));
        let teardown = Arc::clone(&shared);
        let refs = Arc::new(RefCount::new(move || {
            // Idempotent: the take() leaves None, so a second drain cycle
            // that never reopened has nothing left to close.
            if let Some(native) = lock(&teardown).take() {
                drop(native);
                tracing::info!("all references released, database closed");
            }
        }));
        refs.acquire();
        Self { conn: shared, refs }
    }

    /// Queries all columns of `table`.
    ///
    /// `predicate`, `order`, and `limit` are opaque pre-formatted fragments
    /// (e.g. `[id]=3`, `[name] DESC`, `10`); pass `None` to omit the clause.
    /// Rows are materialized before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the statement fails or the handle
    /// has been closed.
    pub fn query(
        &self,
        table: &str,
        predicate: Option<&str>,
        order: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Vec<Row>> {
        let statement = sql::build_select(table, None, predicate, order, limit);
        self.run_query("query", &statement)
    }

    /// Queries a column subset of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the statement fails or the handle
    /// has been closed.
    pub fn query_columns(
        &self,
        table: &str,
        columns: &[&str],
        predicate: Option<&str>,
        order: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Vec<Row>> {
        let statement = sql::build_select(table, Some(columns), predicate, order, limit);
        self.run_query("query", &statement)
    }

    /// Inserts one row staged in `values`; returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] on constraint violations, a missing
    /// table, or a closed handle. A failed insert changes nothing.
    pub fn insert(&self, table: &str, values: &ColumnSet) -> Result<usize> {
        let statement = sql::build_insert(table, values);
        self.run_command("insert", &statement)
    }

    /// Updates rows matching `predicate` (all rows when `None`); returns the
    /// affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the statement fails or the handle
    /// has been closed.
    pub fn update(&self, table: &str, values: &ColumnSet, predicate: Option<&str>) -> Result<usize> {
        let statement = sql::build_update(table, values, predicate);
        self.run_command("update", &statement)
    }

    /// Deletes rows matching `predicate`; returns the affected row count.
    ///
    /// A `None` predicate deletes every row in the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the statement fails or the handle
    /// has been closed.
    pub fn delete(&self, table: &str, predicate: Option<&str>) -> Result<usize> {
        let statement = sql::build_delete(table, predicate);
        self.run_command("delete", &statement)
    }

    /// Runs a caller-assembled SELECT, bypassing the statement builders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the statement fails or the handle
    /// has been closed.
    pub fn raw_query(&self, sql_text: &str) -> Result<Vec<Row>> {
        let _guard = self.refs.guard();
        let conn_guard = lock(&self.conn);
        let conn = conn_guard.as_ref().ok_or_else(|| closed("raw_query"))?;
        Self::fetch_rows(conn, "raw_query", sql_text, &[])
    }

    /// Runs caller-assembled command text (DDL or multiple statements),
    /// bypassing the statement builders, and commits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the statement fails or the handle
    /// has been closed.
    pub fn exec_sql(&self, sql_text: &str) -> Result<()> {
        let _guard = self.refs.guard();
        let conn_guard = lock(&self.conn);
        let conn = conn_guard.as_ref().ok_or_else(|| closed("exec_sql"))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| exec_err("exec_sql", &e))?;
        tx.execute_batch(sql_text)
            .map_err(|e| exec_err("exec_sql", &e))?;
        tx.commit().map_err(|e| exec_err("exec_sql", &e))
    }

    /// Reads the persistent schema version (`PRAGMA user_version`).
    ///
    /// Part of the versioning protocol driven by
    /// [`SchemaManager`](crate::SchemaManager), not general API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the pragma cannot be read or the
    /// handle has been closed.
    pub fn version(&self) -> Result<i32> {
        let _guard = self.refs.guard();
        let conn_guard = lock(&self.conn);
        let conn = conn_guard.as_ref().ok_or_else(|| closed("get_version"))?;
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| exec_err("get_version", &e))
    }

    /// Writes the persistent schema version (`PRAGMA user_version`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the pragma cannot be written or the
    /// handle has been closed.
    pub fn set_version(&self, version: i32) -> Result<()> {
        let _guard = self.refs.guard();
        let conn_guard = lock(&self.conn);
        let conn = conn_guard.as_ref().ok_or_else(|| closed("set_version"))?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|e| exec_err("set_version", &e))
    }

    /// Releases the initial reference taken at open.
    ///
    /// Teardown runs once no operation is in flight; operations issued after
    /// the drain fail with [`Error::Execution`].
    pub fn close(&self) {
        self.refs.release();
    }

    /// True while any reference (including the initial one) is held.
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.refs.has_references()
    }

    fn run_query(&self, operation: &str, statement: &Statement) -> Result<Vec<Row>> {
        let _guard = self.refs.guard();
        let conn_guard = lock(&self.conn);
        let conn = conn_guard.as_ref().ok_or_else(|| closed(operation))?;
        Self::fetch_rows(conn, operation, statement.sql(), statement.params())
    }

    fn run_command(&self, operation: &str, statement: &Statement) -> Result<usize> {
        let _guard = self.refs.guard();
        let conn_guard = lock(&self.conn);
        let conn = conn_guard.as_ref().ok_or_else(|| closed(operation))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| exec_err(operation, &e))?;
        let affected = tx
            .execute(statement.sql(), params_from_iter(statement.params()))
            .map_err(|e| exec_err(operation, &e))?;
        tx.commit().map_err(|e| exec_err(operation, &e))?;
        Ok(affected)
    }

    fn fetch_rows(
        conn: &rusqlite::Connection,
        operation: &str,
        sql_text: &str,
        params: &[Value],
    ) -> Result<Vec<Row>> {
        let mut stmt = conn
            .prepare(sql_text)
            .map_err(|e| exec_err(operation, &e))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| (*name).to_string())
            .collect();

        let mut rows = stmt
            .query(params_from_iter(params))
            .map_err(|e| exec_err(operation, &e))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| exec_err(operation, &e))? {
            let mut entries = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                let value = row.get_ref(i).map_err(|e| exec_err(operation, &e))?;
                entries.push((name.clone(), Value::from_sql(value)));
            }
            out.push(Row::new(entries));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.exec_sql(
            "CREATE TABLE [users](
                [id] TEXT UNIQUE PRIMARY KEY,
                [name] TEXT NOT NULL,
                [age] INTEGER);",
        )
        .unwrap();
        db
    }

    fn user(id: &str, name: &str, age: i64) -> ColumnSet {
        ColumnSet::new()
            .with("id", id)
            .with("name", name)
            .with("age", age)
    }

    #[test]
    fn test_insert_and_query_roundtrip() {
        let db = users_db();
        assert_eq!(db.insert("users", &user("u-1", "David", 31)).unwrap(), 1);
        assert_eq!(db.insert("users", &user("u-2", "Wanda", 27)).unwrap(), 1);

        let rows = db.query("users", None, Some("[age] ASC"), None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("name"), Some("Wanda"));
        assert_eq!(rows[1].integer("age"), Some(31));
    }

    #[test]
    fn test_query_with_predicate_and_limit() {
        let db = users_db();
        for i in 0..5_i64 {
            db.insert("users", &user(&format!("u-{i}"), "Sandy", 20 + i))
                .unwrap();
        }
        let rows = db
            .query("users", Some("[age]>=22"), Some("[age] DESC"), Some("2"))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].integer("age"), Some(24));
    }

    #[test]
    fn test_query_columns_subset() {
        let db = users_db();
        db.insert("users", &user("u-1", "David", 31)).unwrap();
        let rows = db
            .query_columns("users", &["name", "age"], None, None, None)
            .unwrap();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].text("name"), Some("David"));
        assert_eq!(rows[0].get("id"), None);
    }

    #[test]
    fn test_update_and_delete_report_affected_rows() {
        let db = users_db();
        db.insert("users", &user("u-1", "David", 31)).unwrap();
        db.insert("users", &user("u-2", "Wanda", 27)).unwrap();

        let affected = db
            .update(
                "users",
                &ColumnSet::new().with("age", 32),
                Some("[id]='u-1'"),
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = db.query("users", Some("[id]='u-1'"), None, None).unwrap();
        assert_eq!(rows[0].integer("age"), Some(32));

        assert_eq!(db.delete("users", Some("[id]='u-2'")).unwrap(), 1);
        assert_eq!(db.delete("users", None).unwrap(), 1);
        assert!(db.query("users", None, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_bound_text_with_quotes_survives() {
        let db = users_db();
        db.insert("users", &user("u-1", "O'Brien", 40)).unwrap();
        let rows = db.query("users", None, None, None).unwrap();
        assert_eq!(rows[0].text("name"), Some("O'Brien"));
    }

    #[test]
    fn test_failed_statement_is_err_not_panic() {
        let db = users_db();
        let result = db.insert("missing", &user("u-1", "David", 31));
        assert!(matches!(result, Err(Error::Execution { .. })));

        // A duplicate primary key is a constraint violation, still an Err.
        db.insert("users", &user("u-1", "David", 31)).unwrap();
        assert!(db.insert("users", &user("u-1", "David", 31)).is_err());
    }

    #[test]
    fn test_raw_query_and_exec_sql() {
        let db = users_db();
        db.exec_sql("INSERT INTO [users] ([id],[name],[age]) VALUES ('u-1','David',31);")
            .unwrap();
        let rows = db.raw_query("SELECT COUNT(*) AS n FROM [users];").unwrap();
        assert_eq!(rows[0].integer("n"), Some(1));
    }

    #[test]
    fn test_version_roundtrip() {
        let db = users_db();
        assert_eq!(db.version().unwrap(), 0);
        db.set_version(3).unwrap();
        assert_eq!(db.version().unwrap(), 3);
    }

    #[test]
    fn test_close_drains_and_later_calls_fail() {
        let db = users_db();
        assert!(db.has_references());
        db.close();
        assert!(!db.has_references());

        let result = db.query("users", None, None, None);
        assert!(matches!(result, Err(Error::Execution { .. })));
        assert!(db.insert("users", &user("u-1", "David", 31)).is_err());
    }

    #[test]
    fn test_clones_share_one_handle() {
        let db = users_db();
        let other = db.clone();
        other.insert("users", &user("u-1", "David", 31)).unwrap();
        assert_eq!(db.query("users", None, None, None).unwrap().len(), 1);

        db.close();
        assert!(other.query("users", None, None, None).is_err());
    }

    #[test]
    fn test_open_failure_is_open_error() {
        let result = Database::open("/nonexistent-dir/really/app.db");
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_open_on_disk_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        assert!(!path.exists());
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        db.close();
    }
}
