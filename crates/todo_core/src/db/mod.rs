//! SQLite bootstrap for the key-value slot.
//!
//! Opening a connection always runs the migration registry first, so the
//! storage layer can assume `kv_entries` exists once it holds a connection.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or migrating the to-do database.
#[derive(Debug)]
pub enum DbError {
    /// Driver-level failure outside any migration step.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build; refusing to touch it.
    SchemaTooNew { found: u32, supported: u32 },
    /// Migration `version` failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "todo database is at schema version {found}, this build only knows up to {supported}"
            ),
            Self::Migration { version, source } => {
                write!(f, "migration {version} failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
