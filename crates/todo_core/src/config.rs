//! Store configuration.
//!
//! # Responsibility
//! - Resolve where the to-do database lives and which key holds the list.
//!
//! # Invariants
//! - An empty or whitespace `TODO_DB_PATH` counts as unset.

use crate::codec::TODOS_STORAGE_KEY;
use std::path::PathBuf;

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "TODO_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "chacha_todos.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: TODOS_STORAGE_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Reads `TODO_DB_PATH`, falling back to a file in the temp directory.
    pub fn from_env() -> Self {
        Self::from_db_path_value(std::env::var(DB_PATH_ENV).ok())
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    fn from_db_path_value(raw: Option<String>) -> Self {
        let config = Self::default();
        match raw.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => config.with_db_path(path),
            _ => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;
    use std::path::PathBuf;

    #[test]
    fn blank_env_value_falls_back_to_default_path() {
        let config = StoreConfig::from_db_path_value(Some("   ".to_string()));
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn env_value_is_trimmed() {
        let config = StoreConfig::from_db_path_value(Some(" /data/todos.db ".to_string()));
        assert_eq!(config.db_path, PathBuf::from("/data/todos.db"));
        assert_eq!(config.storage_key, "toDos");
    }
}
