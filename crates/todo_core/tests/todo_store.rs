use std::collections::HashSet;
use todo_core::{
    decode_collection, encode_collection, KeyValueStore, MemoryKeyValueStore, StoreConfig,
    StoreError, ToDoCollection, ToDoItem, ToDoStore, TODOS_STORAGE_KEY,
};
use uuid::Uuid;

fn open_memory() -> (ToDoStore, MemoryKeyValueStore) {
    let kv = MemoryKeyValueStore::new();
    let store = ToDoStore::open(kv.clone()).unwrap();
    (store, kv)
}

fn persisted(kv: &MemoryKeyValueStore) -> Option<ToDoCollection> {
    kv.get(TODOS_STORAGE_KEY)
        .unwrap()
        .map(|raw| decode_collection(&raw).unwrap())
}

#[test]
fn empty_start_scenario_add_complete_delete() {
    let (mut store, kv) = open_memory();
    assert!(store.is_empty());

    let id = store.add("Buy milk").expect("non-blank text should be added");
    assert_eq!(store.len(), 1);
    let item = store.get(id).unwrap();
    assert_eq!(item.text, "Buy milk");
    assert!(!item.is_completed);

    assert!(store.set_completed(id, true));
    let item = store.get(id).unwrap();
    assert!(item.is_completed);
    assert_eq!(item.text, "Buy milk");

    assert!(store.delete(id));
    assert!(store.is_empty());

    store.flush();
    assert_eq!(persisted(&kv), Some(ToDoCollection::new()));
    assert_eq!(kv.get(TODOS_STORAGE_KEY).unwrap().as_deref(), Some("{}"));
}

#[test]
fn absent_storage_loads_empty_and_writes_nothing() {
    let (store, kv) = open_memory();
    store.flush();

    assert!(store.is_empty());
    assert_eq!(kv.get(TODOS_STORAGE_KEY).unwrap(), None);
}

#[test]
fn blank_input_is_rejected_without_side_effects() {
    let (mut store, kv) = open_memory();
    store.set_pending_input("   ");

    assert_eq!(store.add(""), None);
    assert_eq!(store.add("   "), None);
    assert_eq!(store.add("\t\n"), None);
    assert_eq!(store.submit_pending_input(), None);

    assert!(store.is_empty());
    assert_eq!(store.pending_input(), "   ");
    store.flush();
    assert_eq!(kv.get(TODOS_STORAGE_KEY).unwrap(), None);
}

#[test]
fn add_clears_pending_input_and_is_visible_immediately() {
    let (mut store, _kv) = open_memory();
    store.set_pending_input("Call mom");

    let id = store.submit_pending_input().unwrap();

    assert_eq!(store.pending_input(), "");
    assert_eq!(store.get(id).map(|item| item.text.as_str()), Some("Call mom"));
    assert_eq!(store.items()[0].id, id);
}

#[test]
fn add_never_reuses_an_existing_id() {
    let (mut store, _kv) = open_memory();
    let ids: HashSet<_> = (0..200)
        .map(|index| store.add(format!("item {index}")).unwrap())
        .collect();

    assert_eq!(ids.len(), 200);
    assert_eq!(store.len(), 200);
}

#[test]
fn unknown_ids_are_silent_noops() {
    let (mut store, kv) = open_memory();
    let id = store.add("keep me").unwrap();
    store.flush();
    let before_memory = store.collection().clone();
    let before_storage = kv.get(TODOS_STORAGE_KEY).unwrap();

    // Overwrite storage so a stray write would be visible.
    kv.set(TODOS_STORAGE_KEY, "sentinel").unwrap();

    let unknown = Uuid::new_v4();
    assert!(!store.delete(unknown));
    assert!(!store.set_completed(unknown, true));
    assert!(!store.update_text(unknown, "ghost"));
    store.flush();

    assert_eq!(store.collection(), &before_memory);
    assert!(store.get(id).is_some());
    assert_eq!(kv.get(TODOS_STORAGE_KEY).unwrap().as_deref(), Some("sentinel"));
    assert!(before_storage.is_some());
}

#[test]
fn set_completed_changes_only_completion_flag() {
    let (mut store, _kv) = open_memory();
    let id = store.add("Write report").unwrap();
    let before = store.get(id).unwrap().clone();

    assert!(store.complete(id));
    let after = store.get(id).unwrap();
    assert!(after.is_completed);
    assert_eq!(after.id, before.id);
    assert_eq!(after.text, before.text);
    assert_eq!(after.created_at, before.created_at);

    assert!(store.uncomplete(id));
    assert_eq!(store.get(id).unwrap(), &before);
}

#[test]
fn update_text_changes_only_text() {
    let (mut store, _kv) = open_memory();
    let id = store.add("Draft").unwrap();
    store.complete(id);
    let before = store.get(id).unwrap().clone();

    assert!(store.update_text(id, "Final"));
    let after = store.get(id).unwrap();
    assert_eq!(after.text, "Final");
    assert_eq!(after.id, before.id);
    assert_eq!(after.is_completed, before.is_completed);
    assert_eq!(after.created_at, before.created_at);
}

#[test]
fn every_mutation_persists_the_full_collection() {
    let (mut store, kv) = open_memory();
    let first = store.add("one").unwrap();
    let second = store.add("two").unwrap();
    store.complete(first);
    store.update_text(second, "two!");
    store.flush();

    let stored = persisted(&kv).unwrap();
    assert_eq!(&stored, store.collection());
    assert!(stored[&first].is_completed);
    assert_eq!(stored[&second].text, "two!");
}

#[test]
fn burst_of_mutations_leaves_final_state_in_storage() {
    let (mut store, kv) = open_memory();
    let id = store.add("toggle me").unwrap();
    for index in 0..100 {
        store.set_completed(id, index % 2 == 0);
        store.add(format!("extra {index}"));
    }
    store.flush();

    assert_eq!(persisted(&kv).as_ref(), Some(store.collection()));
    assert!(!store.get(id).unwrap().is_completed);
}

#[test]
fn reopen_round_trips_collection() {
    let kv = MemoryKeyValueStore::new();
    let expected = {
        let mut store = ToDoStore::open(kv.clone()).unwrap();
        let id = store.add("Buy milk").unwrap();
        store.add("Walk dog");
        store.complete(id);
        store.collection().clone()
    };

    let reopened = ToDoStore::open(kv).unwrap();
    assert_eq!(reopened.collection(), &expected);
}

#[test]
fn malformed_storage_fails_open() {
    let kv = MemoryKeyValueStore::with_entry(TODOS_STORAGE_KEY, "{\"broken\":");

    match ToDoStore::open(kv.clone()) {
        Err(StoreError::Malformed(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed storage must not open"),
    }
    assert_eq!(
        kv.get(TODOS_STORAGE_KEY).unwrap().as_deref(),
        Some("{\"broken\":")
    );
}

#[test]
fn items_are_listed_newest_first() {
    let oldest = ToDoItem::with_id(Uuid::new_v4(), "oldest", 1_000).unwrap();
    let middle = ToDoItem::with_id(Uuid::new_v4(), "middle", 2_000).unwrap();
    let newest = ToDoItem::with_id(Uuid::new_v4(), "newest", 3_000).unwrap();
    let collection: ToDoCollection = [oldest, newest, middle]
        .into_iter()
        .map(|item| (item.id, item))
        .collect();
    let kv = MemoryKeyValueStore::with_entry(
        TODOS_STORAGE_KEY,
        encode_collection(&collection).unwrap(),
    );

    let store = ToDoStore::open(kv).unwrap();
    let texts: Vec<&str> = store.items().iter().map(|item| item.text.as_str()).collect();
    assert_eq!(texts, ["newest", "middle", "oldest"]);
}

#[test]
fn custom_storage_key_is_used_for_load_and_save() {
    let kv = MemoryKeyValueStore::new();
    let mut store = ToDoStore::open_with_key(kv.clone(), "work").unwrap();
    store.add("ship it");
    store.flush();

    assert_eq!(store.storage_key(), "work");
    assert!(kv.get("work").unwrap().is_some());
    assert_eq!(kv.get(TODOS_STORAGE_KEY).unwrap(), None);
}

#[test]
fn sqlite_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::default().with_db_path(dir.path().join("todos.db"));

    let id = {
        let mut store = ToDoStore::open_sqlite(&config).unwrap();
        let id = store.add("Persist me").unwrap();
        store.complete(id);
        id
    };

    let reopened = ToDoStore::open_sqlite(&config).unwrap();
    let item = reopened.get(id).unwrap();
    assert_eq!(item.text, "Persist me");
    assert!(item.is_completed);
    assert_eq!(reopened.failed_writes(), 0);
}
