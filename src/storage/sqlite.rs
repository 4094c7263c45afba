//! SQLite key-value store
//!
//! Several worker processes can open the same database file; SQLite's file
//! locking plus immediate transactions keep the counter and set operations
//! atomic across them.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{KeyValueStore, StorageError, StorageResult};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn parse_integer(key: &str, value: Value) -> StorageResult<i64> {
    match value {
        Value::Integer(n) => Ok(n),
        Value::Text(raw) => raw.parse::<i64>().map_err(|_| StorageError::NotAnInteger {
            key: key.to_string(),
            value: raw,
        }),
        other => Err(StorageError::NotAnInteger {
            key: key.to_string(),
            value: format!("{:?}", other),
        }),
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_values WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_values (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO kv_values (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(inserted == 1)
    }

    fn incr(&self, key: &str, by: i64) -> StorageResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT value FROM kv_values WHERE key = ?1",
                params![key],
                |row| row.get::<_, Value>(0),
            )
            .optional()?;
        let current = match current {
            Some(value) => parse_integer(key, value)?,
            None => 0,
        };

        let next = current + by;
        tx.execute(
            "INSERT INTO kv_values (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, next.to_string()],
        )?;
        tx.commit()?;

        Ok(next)
    }

    fn sadd(&self, key: &str, member: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO kv_sets (set_key, member) VALUES (?1, ?2)",
            params![key, member],
        )?;
        Ok(inserted == 1)
    }

    fn srem(&self, key: &str, member: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM kv_sets WHERE set_key = ?1 AND member = ?2",
            params![key, member],
        )?;
        Ok(removed == 1)
    }

    fn sismember(&self, key: &str, member: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM kv_sets WHERE set_key = ?1 AND member = ?2",
                params![key, member],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&str>) -> StorageResult<String>,
    ) -> StorageResult<String> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT value FROM kv_values WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        // dropping `tx` on error rolls back
        let next = apply(current.as_deref())?;

        tx.execute(
            "INSERT INTO kv_values (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, next],
        )?;
        tx.commit()?;

        Ok(next)
    }

    fn del(&self, key: &str) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM kv_values WHERE key = ?1", params![key])?;
        tx.execute("DELETE FROM kv_sets WHERE set_key = ?1", params![key])?;
        tx.commit()?;
        Ok(())
    }
}
