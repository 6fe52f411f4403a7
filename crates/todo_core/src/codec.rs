//! Wire codec for the persisted to-do collection.
//!
//! # Responsibility
//! - Encode the full collection as one JSON object keyed by item id.
//! - Decode persisted strings back into a validated collection.
//!
//! # Invariants
//! - Decoding never salvages part of a malformed payload.
//! - Every decoded entry's key equals the embedded item `id`.

use crate::model::todo::{ToDoCollection, ToDoId, ToDoItem, ToDoValidationError};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Key of the single key-value slot holding the collection.
pub const TODOS_STORAGE_KEY: &str = "toDos";

#[derive(Debug)]
pub enum CodecError {
    /// Payload is not JSON or not shaped like `{id: item}`.
    Json(serde_json::Error),
    /// Object key is not a valid item id.
    InvalidKey(String),
    /// Object key and the embedded `id` disagree.
    IdMismatch { key: ToDoId, id: ToDoId },
    /// Two object keys name the same id, possibly spelled differently.
    DuplicateId(ToDoId),
    /// Entry decoded but breaks a record invariant.
    InvalidItem {
        id: ToDoId,
        source: ToDoValidationError,
    },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid to-do payload: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid to-do key `{key}`"),
            Self::IdMismatch { key, id } => {
                write!(f, "to-do stored under `{key}` carries id `{id}`")
            }
            Self::DuplicateId(id) => write!(f, "to-do `{id}` is stored more than once"),
            Self::InvalidItem { id, source } => write!(f, "invalid to-do `{id}`: {source}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidItem { source, .. } => Some(source),
            Self::InvalidKey(_) | Self::IdMismatch { .. } | Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Object entries in document order, duplicates kept.
///
/// Decoding straight into a map would let a repeated key overwrite the
/// earlier entry before it could be rejected.
struct RawEntries(Vec<(String, ToDoItem)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("an object mapping to-do ids to to-do records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawEntries, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, ToDoItem>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Serializes the entire collection into its persisted string form.
pub fn encode_collection(collection: &ToDoCollection) -> Result<String, CodecError> {
    Ok(serde_json::to_string(collection)?)
}

/// Parses a persisted string back into a collection.
///
/// # Errors
/// Returns the first problem found; no entries are returned on failure.
pub fn decode_collection(raw: &str) -> Result<ToDoCollection, CodecError> {
    let RawEntries(entries) = serde_json::from_str(raw)?;
    let mut collection = ToDoCollection::new();

    for (key, item) in entries {
        let key_id =
            Uuid::parse_str(&key).map_err(|_| CodecError::InvalidKey(key.clone()))?;
        if key_id != item.id {
            return Err(CodecError::IdMismatch {
                key: key_id,
                id: item.id,
            });
        }
        item.validate().map_err(|source| CodecError::InvalidItem {
            id: item.id,
            source,
        })?;
        if collection.insert(key_id, item).is_some() {
            return Err(CodecError::DuplicateId(key_id));
        }
    }

    Ok(collection)
}
