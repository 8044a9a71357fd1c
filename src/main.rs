//! Demo CLI for openlite: a small user directory on a versioned database.
//!
//! Mirrors the library's intended wiring: one [`SchemaManager`] constructed
//! at startup and threaded through explicitly, a [`RowMapper`] translating
//! between rows and the `User` record, and a store issuing the actual
//! queries.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// CLI output goes to stdout/stderr by design.
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use openlite::{ColumnSet, Database, Result, Row, RowMapper, SchemaHooks, SchemaManager};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Users table contract.
mod contract {
    pub const TABLE: &str = "users";
    pub const COL_ID: &str = "userId";
    pub const COL_FIRST_NAME: &str = "userFirstName";
    pub const COL_LAST_NAME: &str = "userLastName";
    pub const COL_USERNAME: &str = "userUsername";
}

/// Schema version the demo targets.
const DB_VERSION: i32 = 1;

/// A user record.
#[derive(Debug, Clone)]
struct User {
    id: String,
    first_name: String,
    last_name: String,
    username: String,
}

/// Maps between `users` rows and [`User`] records.
struct UserMapper;

impl RowMapper for UserMapper {
    type Entity = User;

    fn from_row(&self, row: &Row) -> Result<User> {
        use contract::{COL_FIRST_NAME, COL_ID, COL_LAST_NAME, COL_USERNAME};
        Ok(User {
            id: row.text(COL_ID).ok_or_else(|| row.missing(COL_ID))?.to_string(),
            first_name: row
                .text(COL_FIRST_NAME)
                .ok_or_else(|| row.missing(COL_FIRST_NAME))?
                .to_string(),
            last_name: row
                .text(COL_LAST_NAME)
                .ok_or_else(|| row.missing(COL_LAST_NAME))?
                .to_string(),
            username: row
                .text(COL_USERNAME)
                .ok_or_else(|| row.missing(COL_USERNAME))?
                .to_string(),
        })
    }

    fn to_values(&self, user: &User) -> ColumnSet {
        use contract::{COL_FIRST_NAME, COL_ID, COL_LAST_NAME, COL_USERNAME};
        ColumnSet::new()
            .with(COL_ID, user.id.as_str())
            .with(COL_FIRST_NAME, user.first_name.as_str())
            .with(COL_LAST_NAME, user.last_name.as_str())
            .with(COL_USERNAME, user.username.as_str())
    }
}

/// Creates the users table; upgrades rebuild it from scratch.
struct UsersSchema;

impl SchemaHooks for UsersSchema {
    fn on_create(&self, db: &Database) -> Result<()> {
        use contract::{COL_FIRST_NAME, COL_ID, COL_LAST_NAME, COL_USERNAME, TABLE};
        db.exec_sql(&format!(
            "CREATE TABLE [{TABLE}](\
                [{COL_ID}] TEXT UNIQUE PRIMARY KEY,\
                [{COL_FIRST_NAME}] TEXT NOT NULL,\
                [{COL_LAST_NAME}] TEXT NOT NULL,\
                [{COL_USERNAME}] TEXT NOT NULL);"
        ))
    }

    fn on_upgrade(&self, db: &Database, _old_version: i32, _new_version: i32) -> Result<()> {
        db.exec_sql(&format!("DROP TABLE IF EXISTS [{}];", contract::TABLE))?;
        self.on_create(db)
    }
}

/// CRUD over the users table.
struct UserStore<'a> {
    db: &'a Database,
    mapper: UserMapper,
}

impl<'a> UserStore<'a> {
    fn new(db: &'a Database) -> Self {
        Self {
            db,
            mapper: UserMapper,
        }
    }

    fn save(&self, user: &User) -> Result<()> {
        self.db
            .insert(contract::TABLE, &self.mapper.to_values(user))?;
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<User>> {
        let order = format!("[{}] ASC", contract::COL_USERNAME);
        self.db
            .query(contract::TABLE, None, Some(&order), None)?
            .iter()
            .map(|row| self.mapper.from_row(row))
            .collect()
    }

    fn remove(&self, id: &str) -> Result<usize> {
        let id = id.replace('\'', "''");
        let predicate = format!("[{}]='{id}'", contract::COL_ID);
        self.db.delete(contract::TABLE, Some(&predicate))
    }
}

/// A small user directory backed by openlite.
#[derive(Parser)]
#[command(name = "openlite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database file (a .db extension is appended if absent).
    #[arg(short, long, global = true, default_value = "example_database")]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Add a user.
    Add {
        /// First name.
        first: String,
        /// Last name.
        last: String,
    },
    /// List all users.
    List,
    /// Remove a user by id.
    Remove {
        /// The user id to remove.
        id: String,
    },
    /// Show the database file and its stored schema version.
    Status,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut manager = SchemaManager::new(cli.database.as_str(), DB_VERSION, UsersSchema);
    let db = manager.open()?.clone();
    let store = UserStore::new(&db);

    match &cli.command {
        Commands::Add { first, last } => {
            let user = User {
                id: Uuid::new_v4().to_string(),
                first_name: first.clone(),
                last_name: last.clone(),
                username: format!("{}{}", first.to_lowercase(), last.to_lowercase()),
            };
            store.save(&user)?;
            println!("added {} ({})", user.username, user.id);
        },
        Commands::List => {
            let users = store.find_all()?;
            if users.is_empty() {
                println!("no users");
            }
            for user in users {
                println!(
                    "{}  {} {}  ({})",
                    user.id, user.first_name, user.last_name, user.username
                );
            }
        },
        Commands::Remove { id } => {
            let removed = store.remove(id)?;
            if removed == 0 {
                println!("no user with id {id}");
            } else {
                println!("removed {id}");
            }
        },
        Commands::Status => {
            let version = db.version()?;
            println!("{}  schema version {version}", manager.path().display());
        },
    }

    manager.close();
    Ok(())
}
