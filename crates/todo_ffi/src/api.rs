//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the four to-do intents (add, delete, toggle, edit) plus list/open
//!   to Dart via FRB.
//! - Own the one process-wide `ToDoStore`; the UI only ever sees snapshots.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call locks the store for exactly one operation.
//! - Calls made before any `todos_open` lazily open the store from
//!   `TODO_DB_PATH`; after a `todos_open`, only the path it named is used.

use log::{error, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use todo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    StoreConfig, ToDoId, ToDoItem, ToDoStore,
};
use uuid::Uuid;

static STORE: OnceLock<Mutex<StoreSlot>> = OnceLock::new();

/// Process-wide store plus the database the UI last asked for.
#[derive(Default)]
struct StoreSlot {
    store: Option<ToDoStore>,
    /// Set by `todos_open`, kept even when that open failed.
    db_path: Option<PathBuf>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the rendered to-do list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoView {
    /// Stable item ID in string form.
    pub id: String,
    pub text: String,
    pub is_completed: bool,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

/// List envelope returned by open/list calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoListResponse {
    pub ok: bool,
    /// Items newest first; empty on failure.
    pub items: Vec<ToDoView>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Result envelope for one mutation intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoActionResponse {
    /// False only when the call could not be carried out (bad id, store
    /// unavailable). Unknown ids and blank input are successful no-ops.
    pub ok: bool,
    /// Whether the collection actually changed.
    pub changed: bool,
    /// Affected or created item ID.
    pub id: Option<String>,
    pub message: String,
}

impl ToDoActionResponse {
    fn changed(message: impl Into<String>, id: ToDoId) -> Self {
        Self {
            ok: true,
            changed: true,
            id: Some(id.to_string()),
            message: message.into(),
        }
    }

    fn unchanged(message: impl Into<String>, id: Option<ToDoId>) -> Self {
        Self {
            ok: true,
            changed: false,
            id: id.map(|value| value.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Opens (or reopens) the process store and returns its items.
///
/// `db_path = None` resolves the path from `TODO_DB_PATH` or the temp dir.
///
/// # FFI contract
/// - Sync call, DB-backed execution; flushes and closes any open store first.
/// - Malformed persisted data is reported as `ok=false`, store stays closed.
#[flutter_rust_bridge::frb(sync)]
pub fn todos_open(db_path: Option<String>) -> ToDoListResponse {
    let config = resolve_config(db_path);
    let mut slot = lock_slot();
    // Drop the previous store first so its writer finishes before we read.
    slot.store.take();
    slot.db_path = Some(config.db_path.clone());

    match ToDoStore::open_sqlite(&config) {
        Ok(store) => {
            let response = list_response(&store);
            slot.store = Some(store);
            response
        }
        Err(err) => {
            error!("event=ffi_todos_open module=ffi status=error error={err}");
            ToDoListResponse {
                ok: false,
                items: Vec::new(),
                message: format!("todos_open failed: {err}"),
            }
        }
    }
}

/// Returns the current items, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn todos_list() -> ToDoListResponse {
    match with_store(|store| list_response(store)) {
        Ok(response) => response,
        Err(err) => ToDoListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("todos_list failed: {err}"),
        },
    }
}

/// Adds a to-do from the new-item text field. Input is trimmed.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(text: String) -> ToDoActionResponse {
    let text = text.trim().to_string();
    match with_store(|store| store.add(text)) {
        Ok(Some(id)) => ToDoActionResponse::changed("To-do added.", id),
        Ok(None) => ToDoActionResponse::unchanged("Nothing to add.", None),
        Err(err) => ToDoActionResponse::failure(format!("todo_add failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: String) -> ToDoActionResponse {
    mutate("todo_delete", &id, "To-do deleted.", |store, id| {
        store.delete(id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_set_completed(id: String, value: bool) -> ToDoActionResponse {
    let message = if value {
        "To-do completed."
    } else {
        "To-do reopened."
    };
    mutate("todo_set_completed", &id, message, |store, id| {
        store.set_completed(id, value)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_update_text(id: String, text: String) -> ToDoActionResponse {
    mutate("todo_update_text", &id, "To-do updated.", |store, id| {
        store.update_text(id, text)
    })
}

/// Waits for queued writes; call when the app goes to background.
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn todos_flush() -> String {
    match with_store(|store| store.flush()) {
        Ok(()) => String::new(),
        Err(err) => format!("todos_flush failed: {err}"),
    }
}

fn mutate(
    operation: &str,
    raw_id: &str,
    message: &str,
    apply: impl FnOnce(&mut ToDoStore, ToDoId) -> bool,
) -> ToDoActionResponse {
    let id = match Uuid::parse_str(raw_id.trim()) {
        Ok(id) => id,
        Err(_) => {
            warn!("event=ffi_{operation} module=ffi status=rejected reason=invalid_id");
            return ToDoActionResponse::failure(format!("{operation} failed: invalid id `{raw_id}`"));
        }
    };

    match with_store(|store| apply(store, id)) {
        Ok(true) => ToDoActionResponse::changed(message, id),
        Ok(false) => ToDoActionResponse::unchanged("To-do not found; nothing changed.", Some(id)),
        Err(err) => ToDoActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn with_store<T>(f: impl FnOnce(&mut ToDoStore) -> T) -> Result<T, String> {
    let mut slot = lock_slot();
    if slot.store.is_none() {
        // Never fall back to the environment once the UI picked a database.
        let config = match &slot.db_path {
            Some(path) => StoreConfig::default().with_db_path(path.clone()),
            None => StoreConfig::from_env(),
        };
        let store = ToDoStore::open_sqlite(&config).map_err(|err| {
            format!(
                "store unavailable at `{}`: {err}",
                config.db_path.display()
            )
        })?;
        slot.db_path = Some(config.db_path);
        slot.store = Some(store);
    }
    match slot.store.as_mut() {
        Some(store) => Ok(f(store)),
        None => Err("store unavailable".to_string()),
    }
}

fn lock_slot() -> MutexGuard<'static, StoreSlot> {
    let slot = STORE.get_or_init(|| Mutex::new(StoreSlot::default()));
    // Poisoned means an earlier call panicked while holding the slot; the
    // store may be partway through that call. todos_open reloads from disk.
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn resolve_config(db_path: Option<String>) -> StoreConfig {
    match db_path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => StoreConfig::default().with_db_path(path),
        _ => StoreConfig::from_env(),
    }
}

fn list_response(store: &ToDoStore) -> ToDoListResponse {
    let items = store.items().into_iter().map(to_view).collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No to-dos.".to_string()
    } else {
        format!("{} to-do(s).", items.len())
    };
    ToDoListResponse {
        ok: true,
        items,
        message,
    }
}

fn to_view(item: &ToDoItem) -> ToDoView {
    ToDoView {
        id: item.id.to_string(),
        text: item.text.clone(),
        is_completed: item.is_completed,
        created_at: item.created_at,
    }
}
