//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `todo_core` linkage.
//! - Print the persisted to-do list of the configured database.

use todo_core::{StoreConfig, ToDoStore};

fn main() {
    println!("todo_core ping={}", todo_core::ping());
    println!("todo_core version={}", todo_core::core_version());

    let config = StoreConfig::from_env();
    println!("todo_core db_path={}", config.db_path.display());

    match ToDoStore::open_sqlite(&config) {
        Ok(store) => {
            println!("todo_core items={}", store.len());
            for item in store.items() {
                let mark = if item.is_completed { "x" } else { " " };
                println!("[{mark}] {} {}", item.id, item.text);
            }
        }
        Err(err) => {
            eprintln!("todo_core open failed: {err}");
            std::process::exit(1);
        }
    }
}
