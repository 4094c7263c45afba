//! Storage traits and error types
//!
//! This module defines the key-value interface shared by every worker and
//! the associated error types.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Value at {key} is not an integer: {value}")]
    NotAnInteger { key: String, value: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared key-value store used for crawl bookkeeping
///
/// Implementations must make `set_if_absent`, `incr`, `sadd` and `update`
/// atomic with respect to every other caller of the same store, including
/// callers in other processes when the backend is shared between them.
/// Visit marking, page counting and status merging rely on that.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored at `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` at `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Stores `value` only if `key` is absent
    ///
    /// Returns true if the value was written.
    fn set_if_absent(&self, key: &str, value: &str) -> StorageResult<bool>;

    /// Adds `by` to the integer at `key` (absent counts as 0)
    ///
    /// Returns the new value.
    fn incr(&self, key: &str, by: i64) -> StorageResult<i64>;

    /// Adds `member` to the set at `key`
    ///
    /// Returns true if the member was not present before.
    fn sadd(&self, key: &str, member: &str) -> StorageResult<bool>;

    /// Removes `member` from the set at `key`
    ///
    /// Returns true if the member was present.
    fn srem(&self, key: &str, member: &str) -> StorageResult<bool>;

    /// Checks whether `member` belongs to the set at `key`
    fn sismember(&self, key: &str, member: &str) -> StorageResult<bool>;

    /// Replaces the value at `key` with `apply(current)` in one atomic step
    ///
    /// No other write to `key` can land between the read and the write. An
    /// error from `apply` leaves the stored value untouched. `apply` must
    /// not call back into the store. Returns the value written.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&str>) -> StorageResult<String>,
    ) -> StorageResult<String>;

    /// Removes `key`, whether it holds a value or a set
    fn del(&self, key: &str) -> StorageResult<()>;
}
