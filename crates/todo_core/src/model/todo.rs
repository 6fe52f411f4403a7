//! To-do item domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record persisted in the key-value slot.
//! - Provide creation helpers and validation for imported records.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `created_at` is set once at creation and never changes.
//! - New items always start incomplete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of one to-do item.
pub type ToDoId = Uuid;

/// In-memory mapping from item id to item.
///
/// Iteration order is by id and carries no meaning; display order is
/// derived separately (see `ToDoStore::items`).
pub type ToDoCollection = BTreeMap<ToDoId, ToDoItem>;

/// Validation failures for to-do records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToDoValidationError {
    NilId,
    InvalidCreatedAt(i64),
}

impl Display for ToDoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "to-do id must not be nil"),
            Self::InvalidCreatedAt(value) => {
                write!(f, "createdAt ({value}) must be a non-negative epoch millis value")
            }
        }
    }
}

impl Error for ToDoValidationError {}

/// One to-do record.
///
/// Serialized with camelCase wire names (`isCompleted`, `createdAt`) so the
/// persisted shape matches what the mobile shell has always stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToDoItem {
    pub id: ToDoId,
    /// User-provided label.
    pub text: String,
    pub is_completed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl ToDoItem {
    /// Creates an incomplete item with a generated id stamped with the
    /// current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_completed: false,
            created_at: now_epoch_ms(),
        }
    }

    /// Creates an incomplete item with a caller-provided id and timestamp.
    ///
    /// Used by import paths and tests where identity already exists.
    ///
    /// # Errors
    /// - `NilId` when `id` is the nil UUID.
    /// - `InvalidCreatedAt` when `created_at` is negative.
    pub fn with_id(
        id: ToDoId,
        text: impl Into<String>,
        created_at: i64,
    ) -> Result<Self, ToDoValidationError> {
        let item = Self {
            id,
            text: text.into(),
            is_completed: false,
            created_at,
        };
        item.validate()?;
        Ok(item)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ToDoValidationError> {
        if self.id.is_nil() {
            return Err(ToDoValidationError::NilId);
        }
        if self.created_at < 0 {
            return Err(ToDoValidationError::InvalidCreatedAt(self.created_at));
        }
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// A clock set before 1970 yields `0` rather than a negative timestamp.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Returns `true` when `text` has no visible characters.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
