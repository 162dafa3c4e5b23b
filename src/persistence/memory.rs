use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::KeyValueStore;
use crate::errors::{StorageError, StorageResult};

/// In-memory store with an optional byte quota.
///
/// Clones share state, so a test can keep a handle and inspect what the
/// adapter wrote.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    slots: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes whose total stored size would exceed `quota` bytes are refused.
    pub fn with_quota(quota: usize) -> Self {
        let store = Self::default();
        store.lock().quota = Some(quota);
        store
    }

    pub fn set_quota(&self, quota: Option<usize>) {
        self.lock().quota = quota;
    }

    /// Successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().slots.get(key).cloned()
    }

    /// Place content directly, bypassing quota and write counting.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock().slots.insert(key.to_string(), value.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.lock();
        if let Some(quota) = inner.quota {
            let others: usize = inner
                .slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        inner.slots.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.lock().slots.remove(key);
        Ok(())
    }
}
