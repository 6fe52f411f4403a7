//! Collection store: the single owner of the in-memory to-do collection.
//!
//! # Responsibility
//! - Load the persisted collection once at open.
//! - Expose add/delete/complete/edit as the only mutation entry points.
//! - Queue a full snapshot write after every effective mutation.
//!
//! # Invariants
//! - Item ids are unique and never reassigned.
//! - In-memory state is authoritative; storage catches up through the
//!   write queue (eventually consistent, never partial).
//! - No-op operations (blank add, unknown id) never touch storage.
//! - Malformed persisted data fails `open`; nothing is salvaged.

mod write_queue;

pub use write_queue::WriteQueue;

use crate::codec::{decode_collection, encode_collection, CodecError, TODOS_STORAGE_KEY};
use crate::config::StoreConfig;
use crate::model::todo::{is_blank, ToDoCollection, ToDoId, ToDoItem};
use crate::storage::{KeyValueStore, SqliteKeyValueStore, StorageError};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Key-value backend failed to open or read.
    Storage(StorageError),
    /// Persisted value exists but does not decode.
    Malformed(CodecError),
    /// Writer thread could not be started.
    WriterSpawn(std::io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Malformed(err) => write!(f, "persisted to-do collection is malformed: {err}"),
            Self::WriterSpawn(err) => write!(f, "failed to start to-do writer: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Malformed(err) => Some(err),
            Self::WriterSpawn(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Reads and decodes the collection stored under `key`.
///
/// An absent key yields an empty collection.
///
/// # Errors
/// - `Storage` when the backend read fails.
/// - `Malformed` when the stored value does not decode.
pub fn load_collection(kv: &dyn KeyValueStore, key: &str) -> StoreResult<ToDoCollection> {
    let started_at = Instant::now();
    info!("event=todos_load module=store status=start");

    let raw = match kv.get(key) {
        Ok(raw) => raw,
        Err(err) => {
            error!(
                "event=todos_load module=store status=error duration_ms={} error_code=kv_get_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let Some(raw) = raw else {
        info!(
            "event=todos_load module=store status=ok source=empty count=0 duration_ms={}",
            started_at.elapsed().as_millis()
        );
        return Ok(ToDoCollection::new());
    };

    match decode_collection(&raw) {
        Ok(collection) => {
            info!(
                "event=todos_load module=store status=ok source=storage count={} duration_ms={}",
                collection.len(),
                started_at.elapsed().as_millis()
            );
            Ok(collection)
        }
        Err(err) => {
            error!(
                "event=todos_load module=store status=error bytes={} duration_ms={} error_code=malformed_collection error={}",
                raw.len(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(StoreError::Malformed(err))
        }
    }
}

/// In-memory to-do collection kept in sync with one key-value slot.
///
/// Readers get shared views (`items`, `get`, `collection`); every change goes
/// through the `&mut self` operations below.
pub struct ToDoStore {
    collection: ToDoCollection,
    pending_input: String,
    storage_key: String,
    writer: WriteQueue,
}

impl ToDoStore {
    /// Loads the collection from `kv` under the default key and takes
    /// ownership of `kv` for subsequent writes.
    pub fn open<S>(kv: S) -> StoreResult<Self>
    where
        S: KeyValueStore + 'static,
    {
        Self::open_with_key(kv, TODOS_STORAGE_KEY)
    }

    /// Same as [`ToDoStore::open`] with a caller-chosen storage key.
    pub fn open_with_key<S>(kv: S, storage_key: impl Into<String>) -> StoreResult<Self>
    where
        S: KeyValueStore + 'static,
    {
        let storage_key = storage_key.into();
        let collection = load_collection(&kv, &storage_key)?;
        let writer = WriteQueue::spawn(kv).map_err(StoreError::WriterSpawn)?;

        Ok(Self {
            collection,
            pending_input: String::new(),
            storage_key,
            writer,
        })
    }

    /// Opens the SQLite file named by `config` and loads from it.
    pub fn open_sqlite(config: &StoreConfig) -> StoreResult<Self> {
        let kv = SqliteKeyValueStore::open(&config.db_path)?;
        Self::open_with_key(kv, config.storage_key.clone())
    }

    /// Adds a new incomplete item.
    ///
    /// Returns `None` without touching anything when `text` is blank.
    /// Otherwise persists, clears the pending input and returns the new id.
    pub fn add(&mut self, text: impl Into<String>) -> Option<ToDoId> {
        let text = text.into();
        if is_blank(&text) {
            debug!("event=todo_add module=store status=skipped reason=blank_text");
            return None;
        }

        let mut item = ToDoItem::new(text);
        // v4 collisions are practically impossible, but ids must stay unique.
        while self.collection.contains_key(&item.id) {
            item.id = ToDoId::new_v4();
        }
        let id = item.id;
        self.collection.insert(id, item);
        self.pending_input.clear();
        debug!("event=todo_add module=store status=ok id={id}");
        self.persist();
        Some(id)
    }

    /// Removes the item with `id`. Returns whether something was removed.
    pub fn delete(&mut self, id: ToDoId) -> bool {
        if self.collection.remove(&id).is_none() {
            debug!("event=todo_delete module=store status=skipped reason=unknown_id id={id}");
            return false;
        }
        debug!("event=todo_delete module=store status=ok id={id}");
        self.persist();
        true
    }

    /// Sets the completion flag of `id`, leaving every other field intact.
    ///
    /// Returns whether `id` was found.
    pub fn set_completed(&mut self, id: ToDoId, value: bool) -> bool {
        let Some(item) = self.collection.get_mut(&id) else {
            debug!("event=todo_set_completed module=store status=skipped reason=unknown_id id={id}");
            return false;
        };
        item.is_completed = value;
        debug!("event=todo_set_completed module=store status=ok id={id} value={value}");
        self.persist();
        true
    }

    pub fn complete(&mut self, id: ToDoId) -> bool {
        self.set_completed(id, true)
    }

    pub fn uncomplete(&mut self, id: ToDoId) -> bool {
        self.set_completed(id, false)
    }

    /// Replaces the text of `id`, leaving every other field intact.
    ///
    /// Returns whether `id` was found.
    pub fn update_text(&mut self, id: ToDoId, new_text: impl Into<String>) -> bool {
        let Some(item) = self.collection.get_mut(&id) else {
            debug!("event=todo_update_text module=store status=skipped reason=unknown_id id={id}");
            return false;
        };
        item.text = new_text.into();
        debug!("event=todo_update_text module=store status=ok id={id}");
        self.persist();
        true
    }

    /// Queues a full-replace write of the current collection.
    ///
    /// Fire-and-forget: failures are logged by the writer, never returned.
    pub fn persist(&self) {
        match encode_collection(&self.collection) {
            Ok(snapshot) => self.writer.enqueue(&self.storage_key, snapshot),
            Err(err) => error!(
                "event=todos_persist module=store status=error error_code=encode_failed error={err}"
            ),
        }
    }

    /// Blocks until every queued write has reached storage.
    pub fn flush(&self) {
        self.writer.flush();
    }

    /// Number of background writes that failed during this session.
    pub fn failed_writes(&self) -> u64 {
        self.writer.failed_writes()
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Mirrors the "new to-do" text field.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Adds the pending input as a new item (see [`ToDoStore::add`]).
    pub fn submit_pending_input(&mut self) -> Option<ToDoId> {
        let text = self.pending_input.clone();
        self.add(text)
    }

    pub fn get(&self, id: ToDoId) -> Option<&ToDoItem> {
        self.collection.get(&id)
    }

    pub fn collection(&self) -> &ToDoCollection {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Items in display order: newest first, ties by id.
    pub fn items(&self) -> Vec<&ToDoItem> {
        let mut items: Vec<&ToDoItem> = self.collection.values().collect();
        items.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        items
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}
