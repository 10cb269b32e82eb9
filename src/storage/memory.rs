//! In-memory store backend

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde_json::Value;

use super::{KeyValueStore, StorageKey, StoreSnapshot};
use crate::error::StoreError;

/// Shared in-memory store. Clones see the same data, which lets a test
/// "close" a popup and open a new one against the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<StorageKey, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given entries
    pub fn with_entries(entries: &[(StorageKey, Value)]) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.extend(entries.iter().cloned());
        }
        store
    }

    /// Read a single key, mostly for assertions
    pub fn peek(&self, key: StorageKey) -> Option<Value> {
        self.values.lock().ok().and_then(|values| values.get(&key).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StorageKey, Value>>, StoreError> {
        self.values
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, keys: &[StorageKey]) -> Result<StoreSnapshot, StoreError> {
        let values = self.lock()?;
        let mut snapshot = StoreSnapshot::new();
        for key in keys {
            if let Some(value) = values.get(key) {
                snapshot.insert(*key, value.clone());
            }
        }
        Ok(snapshot)
    }

    fn set(&self, entries: &[(StorageKey, Value)]) -> Result<(), StoreError> {
        let mut values = self.lock()?;
        values.extend(entries.iter().cloned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.lock()?.remove(&key);
        Ok(())
    }
}
