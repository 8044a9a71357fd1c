//! # openlite
//!
//! A small versioned `SQLite` access layer.
//!
//! openlite opens a single on-disk database file, creates or upgrades its
//! schema from a caller-declared version number, and exposes query, insert,
//! update, and delete operations built from a small SQL statement assembler.
//!
//! ## Pieces
//!
//! - [`SchemaManager`]: owns the open/create/upgrade protocol. On first open
//!   of a file it runs your [`SchemaHooks::on_create`] and stamps the target
//!   version; on reopen it compares the stored version and runs
//!   [`SchemaHooks::on_upgrade`] if the file is behind.
//! - [`Database`]: the only component that performs real I/O. Every operation
//!   holds a reference on the handle for its whole body, so one thread cannot
//!   tear the connection down while another thread's call is mid-flight.
//! - [`sql`]: pure statement construction. Builders emit `?N` placeholders and
//!   carry values separately; execution always binds parameters.
//! - [`ColumnSet`]: ordered column/value staging for a single row. Insertion
//!   order determines the positional correspondence between column list and
//!   value list in generated INSERT/UPDATE text.
//!
//! ## Example
//!
//! ```rust,ignore
//! use openlite::{ColumnSet, Database, Result, SchemaHooks, SchemaManager};
//!
//! struct Hooks;
//!
//! impl SchemaHooks for Hooks {
//!     fn on_create(&self, db: &Database) -> Result<()> {
//!         db.exec_sql("CREATE TABLE [users]([id] TEXT PRIMARY KEY,[name] TEXT);")
//!     }
//!
//!     fn on_upgrade(&self, db: &Database, _old: i32, _new: i32) -> Result<()> {
//!         db.exec_sql("DROP TABLE IF EXISTS [users];")?;
//!         self.on_create(db)
//!     }
//! }
//!
//! let mut manager = SchemaManager::new("app", 1, Hooks);
//! let db = manager.open()?;
//! db.insert("users", &ColumnSet::new().with("id", "u-1").with("name", "Tyler"))?;
//! manager.close();
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

pub mod database;
pub mod refs;
pub mod row;
pub mod schema;
pub mod sql;
pub mod values;

pub use database::Database;
pub use refs::{RefCount, RefGuard};
pub use row::{Row, RowMapper};
pub use schema::{SchemaHooks, SchemaManager};
pub use sql::Statement;
pub use values::{ColumnSet, Value};

/// Error type for openlite operations.
///
/// Both variants are non-fatal: a failed open or a failed statement is
/// terminal for the call that triggered it and nothing else. The one fatal
/// condition in this crate, a reference count driven negative, is a
/// programming error in acquire/release pairing and panics instead of
/// surfacing here (see [`refs::RefCount::release`]).
#[derive(Debug, ThisError)]
pub enum Error {
    /// The database file could not be opened.
    ///
    /// Raised when the native link cannot be established: the path is not
    /// writable, a parent directory is missing, or the file is not a
    /// database.
    #[error("failed to open database at '{path}': {cause}")]
    Open {
        /// Path of the database file.
        path: String,
        /// The underlying driver error.
        cause: String,
    },

    /// A statement failed to execute.
    ///
    /// Raised for malformed SQL, constraint violations, and operations
    /// issued after the handle has drained and closed.
    #[error("operation '{operation}' failed: {cause}")]
    Execution {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for openlite operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Open {
            path: "./missing/app.db".to_string(),
            cause: "unable to open database file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to open database at './missing/app.db': unable to open database file"
        );

        let err = Error::Execution {
            operation: "insert".to_string(),
            cause: "no such table: users".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'insert' failed: no such table: users"
        );
    }
}
