//! Core state and persistence for the ChaCha to-do app.
//! This crate is the single source of truth for to-do invariants.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;

pub use codec::{decode_collection, encode_collection, CodecError, TODOS_STORAGE_KEY};
pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::todo::{ToDoCollection, ToDoId, ToDoItem, ToDoValidationError};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};
pub use store::{load_collection, StoreError, StoreResult, ToDoStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
