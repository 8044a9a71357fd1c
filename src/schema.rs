//! The open/create/upgrade protocol for a versioned database file.
//!
//! A [`SchemaManager`] owns one database file and a desired schema version.
//! Opening a file that does not exist yet runs [`SchemaHooks::on_create`] and
//! stamps the desired version; opening an existing file whose stored version
//! is behind runs [`SchemaHooks::on_upgrade`] with the (old, new) pair and
//! re-stamps. A stored version at or above the desired one runs neither hook;
//! there is no downgrade path.

use crate::database::Database;
use crate::Result;
use std::path::{Path, PathBuf};

/// Schema lifecycle callbacks supplied by the caller.
///
/// Both hooks receive the live [`Database`] and typically issue DDL through
/// [`Database::exec_sql`]. Errors propagate out of
/// [`SchemaManager::open`]; the version is only stamped after the hook
/// succeeds.
pub trait SchemaHooks {
    /// Called exactly once, when the database file is first created.
    ///
    /// # Errors
    ///
    /// Any error aborts the open; the version is not stamped.
    fn on_create(&self, db: &Database) -> Result<()>;

    /// Called when the stored version is behind the desired one.
    ///
    /// `old_version` is what the file carried, `new_version` what the
    /// manager was constructed with.
    ///
    /// # Errors
    ///
    /// Any error aborts the open; the version is not re-stamped.
    fn on_upgrade(&self, db: &Database, old_version: i32, new_version: i32) -> Result<()>;
}

/// Opens a database file, creating or upgrading its schema as needed.
///
/// Construct one per database file at process start and thread it through
/// explicitly; there are no ambient singletons. [`open`](Self::open) is lazy
/// and idempotent, [`close`](Self::close) reaches the terminal state; nothing
/// tears down implicitly.
///
/// # Examples
///
/// ```
/// use openlite::{Database, Result, SchemaHooks, SchemaManager};
///
/// struct Hooks;
///
/// impl SchemaHooks for Hooks {
///     fn on_create(&self, db: &Database) -> Result<()> {
///         db.exec_sql("CREATE TABLE [users]([id] TEXT PRIMARY KEY);")
///     }
///
///     fn on_upgrade(&self, db: &Database, _old: i32, _new: i32) -> Result<()> {
///         db.exec_sql("DROP TABLE IF EXISTS [users];")?;
///         self.on_create(db)
///     }
/// }
///
/// # fn run() -> Result<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let name = dir.path().join("app").display().to_string();
/// let mut manager = SchemaManager::new(name, 1, Hooks);
/// let db = manager.open()?;
/// assert_eq!(db.version()?, 1);
/// manager.close();
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct SchemaManager<H: SchemaHooks> {
    path: PathBuf,
    version: i32,
    hooks: H,
    db: Option<Database>,
}

impl<H: SchemaHooks> SchemaManager<H> {
    /// Creates a manager for the file `name`, targeting `version`.
    ///
    /// A `.db` extension is appended when `name` lacks one.
    pub fn new(name: impl Into<String>, version: i32, hooks: H) -> Self {
        let name = name.into();
        let file = if name.ends_with(".db") {
            name
        } else {
            format!("{name}.db")
        };
        Self {
            path: PathBuf::from(file),
            version,
            hooks,
            db: None,
        }
    }

    /// The resolved database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The desired schema version this manager stamps.
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// Opens the database, running create/upgrade hooks as required.
    ///
    /// The first call does the work; later calls return the same handle.
    /// The file-existence check happens before the handle is constructed,
    /// because construction itself creates the file; reordering those two
    /// steps would make every open look like a reopen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`](crate::Error::Open) when the file cannot be
    /// opened, or any error a hook propagates. After a hook failure the
    /// manager holds no handle and the stored version is left untouched, so
    /// the next open retries the same transition.
    pub fn open(&mut self) -> Result<&Database> {
        if let Some(ref db) = self.db {
            return Ok(db);
        }

        let existed = self.path.exists();
        let db = Database::open(&self.path)?;

        if existed {
            let stored = db.version()?;
            if self.version > stored {
                self.hooks.on_upgrade(&db, stored, self.version)?;
                db.set_version(self.version)?;
                tracing::info!(
                    path = %self.path.display(),
                    from = stored,
                    to = self.version,
                    "database upgraded"
                );
            }
        } else {
            self.hooks.on_create(&db)?;
            db.set_version(self.version)?;
            tracing::info!(
                path = %self.path.display(),
                version = self.version,
                "database created"
            );
        }

        Ok(self.db.insert(db))
    }

    /// Releases the handle's initial reference and forgets it.
    ///
    /// The native connection closes once no operation is in flight. This is
    /// the only way to reach the terminal state.
    pub fn close(&mut self) {
        if let Some(db) = self.db.take() {
            db.close();
        }
    }
}
