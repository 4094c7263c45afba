//! In-process key-value store
//!
//! Backs single-process crawls and tests. Every operation runs under one
//! mutex, which makes each of them atomic.

use crate::storage::traits::{KeyValueStore, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
}

/// Key-value store held in local memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str) -> StorageResult<bool> {
        let mut inner = self.lock()?;
        if inner.values.contains_key(key) {
            return Ok(false);
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn incr(&self, key: &str, by: i64) -> StorageResult<i64> {
        let mut inner = self.lock()?;
        let current = match inner.values.get(key) {
            Some(raw) => raw.parse::<i64>().map_err(|_| StorageError::NotAnInteger {
                key: key.to_string(),
                value: raw.clone(),
            })?,
            None => 0,
        };
        let next = current + by;
        inner.values.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    fn sadd(&self, key: &str, member: &str) -> StorageResult<bool> {
        Ok(self
            .lock()?
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    fn srem(&self, key: &str, member: &str) -> StorageResult<bool> {
        Ok(self
            .lock()?
            .sets
            .get_mut(key)
            .map(|set| set.remove(member))
            .unwrap_or(false))
    }

    fn sismember(&self, key: &str, member: &str) -> StorageResult<bool> {
        Ok(self
            .lock()?
            .sets
            .get(key)
            .map(|set| set.contains(member))
            .unwrap_or(false))
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&str>) -> StorageResult<String>,
    ) -> StorageResult<String> {
        let mut inner = self.lock()?;
        let next = apply(inner.values.get(key).map(String::as_str))?;
        inner.values.insert(key.to_string(), next.clone());
        Ok(next)
    }

    fn del(&self, key: &str) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.values.remove(key);
        inner.sets.remove(key);
        Ok(())
    }
}
