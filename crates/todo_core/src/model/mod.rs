//! To-do domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record and the collection it lives in.
//!
//! # Invariants
//! - Every item is identified by a stable `ToDoId`.
//! - Collection keys always equal the id of the item they map to.

pub mod todo;
