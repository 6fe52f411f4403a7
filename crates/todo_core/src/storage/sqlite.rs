//! SQLite-backed key-value storage.
//!
//! # Invariants
//! - Only migrated connections are accepted (`try_new` checks schema).
//! - Each `set` is a single upsert statement, so readers never observe a
//!   half-written value.

use super::{KeyValueStore, StorageError, StorageResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::open_db;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const KV_TABLE: &str = "kv_entries";

/// Key-value store over the `kv_entries` table.
///
/// Owns its connection so it can be handed to the write queue thread.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Opens (creating if needed) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = open_db(path)?;
        Self::try_new(conn)
    }

    /// Wraps an already-open connection after checking it was migrated.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` is not the
    ///   latest known migration.
    /// - `MissingRequiredTable` when `kv_entries` is absent.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

fn ensure_connection_ready(conn: &Connection) -> StorageResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StorageError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [KV_TABLE],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(StorageError::MissingRequiredTable(KV_TABLE));
    }

    Ok(())
}
