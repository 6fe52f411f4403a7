//! Key-value storage contracts and implementations.
//!
//! # Responsibility
//! - Define the two-operation persistence API (`get`/`set`) the store relies on.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - `set` is a full replace of the value under `key`, never an append/patch.
//! - Absence of a key is a normal `Ok(None)`, not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error for key-value reads and writes.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Connection was not migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// A previous writer panicked while holding the in-memory map.
    Poisoned,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::Poisoned => write!(f, "in-memory key-value store is poisoned"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Minimal persistence API for string values under string keys.
///
/// Implementations must be `Send` so the write queue can move them onto its
/// writer thread.
pub trait KeyValueStore: Send {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Stores `value` under `key`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}
