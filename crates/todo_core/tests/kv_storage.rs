use rusqlite::Connection;
use todo_core::db::migrations::latest_version;
use todo_core::db::open_db_in_memory;
use todo_core::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError};

#[test]
fn sqlite_get_returns_none_for_absent_key() {
    let kv = SqliteKeyValueStore::try_new(open_db_in_memory().unwrap()).unwrap();
    assert_eq!(kv.get("toDos").unwrap(), None);
}

#[test]
fn sqlite_set_replaces_previous_value() {
    let kv = SqliteKeyValueStore::try_new(open_db_in_memory().unwrap()).unwrap();

    kv.set("toDos", "{\"first\":true}").unwrap();
    kv.set("toDos", "{}").unwrap();

    assert_eq!(kv.get("toDos").unwrap().as_deref(), Some("{}"));
}

#[test]
fn sqlite_keys_are_independent() {
    let kv = SqliteKeyValueStore::try_new(open_db_in_memory().unwrap()).unwrap();

    kv.set("toDos", "a").unwrap();
    kv.set("archive", "b").unwrap();

    assert_eq!(kv.get("toDos").unwrap().as_deref(), Some("a"));
    assert_eq!(kv.get("archive").unwrap().as_deref(), Some("b"));
}

#[test]
fn sqlite_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");

    SqliteKeyValueStore::open(&path)
        .unwrap()
        .set("toDos", "persisted")
        .unwrap();

    let reopened = SqliteKeyValueStore::open(&path).unwrap();
    assert_eq!(reopened.get("toDos").unwrap().as_deref(), Some("persisted"));
}

#[test]
fn sqlite_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteKeyValueStore::try_new(conn) {
        Err(StorageError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn sqlite_rejects_connection_without_kv_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteKeyValueStore::try_new(conn),
        Err(StorageError::MissingRequiredTable("kv_entries"))
    ));
}

#[test]
fn memory_clones_share_entries() {
    let kv = MemoryKeyValueStore::new();
    let observer = kv.clone();

    kv.set("toDos", "{}").unwrap();

    assert_eq!(observer.get("toDos").unwrap().as_deref(), Some("{}"));
    assert_eq!(observer.get("missing").unwrap(), None);
}

#[test]
fn memory_with_entry_is_seeded() {
    let kv = MemoryKeyValueStore::with_entry("toDos", "seed");
    assert_eq!(kv.get("toDos").unwrap().as_deref(), Some("seed"));
}
