//! Storage module for shared crawl state
//!
//! This module handles the state every worker shares:
//! - A key-value interface with atomic set-if-absent, increment and set-add
//! - An in-process backend and a SQLite backend (shareable between processes)
//! - Per-crawl status, visited set and visited counter on top of it

mod crawl_state;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use crawl_state::{CrawlStateStore, Reservation};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{KeyValueStore, StorageError, StorageResult};

use crate::config::StorageConfig;
use std::path::Path;
use std::sync::Arc;

/// Opens the key-value backend selected by the configuration
///
/// `":memory:"` selects [`MemoryStore`]; anything else is a SQLite file path.
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn KeyValueStore>> {
    if config.is_in_memory() {
        tracing::info!("Using in-process state store");
        Ok(Arc::new(MemoryStore::new()))
    } else {
        tracing::info!("Using SQLite state store at {}", config.database_path);
        Ok(Arc::new(SqliteStore::new(Path::new(&config.database_path))?))
    }
}
