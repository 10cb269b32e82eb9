//! Key-value persistence
//!
//! The popup keeps all of its durable state in a flat key-value store. This
//! module defines the store contract and the two backends: a JSON file on
//! disk and an in-memory map.

pub mod json_file;
pub mod keys;
pub mod memory;

use serde_json::Value;

use crate::error::StoreError;

pub use json_file::JsonFileStore;
pub use keys::{StorageKey, StoreSnapshot};
pub use memory::MemoryStore;

/// Store contract used by the toggle state controller.
///
/// Reads are all-or-nothing snapshots of the requested keys; absent keys are
/// left out of the snapshot. Writes replace the given keys and leave the rest
/// untouched.
pub trait KeyValueStore: Send {
    fn get(&self, keys: &[StorageKey]) -> Result<StoreSnapshot, StoreError>;

    fn set(&self, entries: &[(StorageKey, Value)]) -> Result<(), StoreError>;

    fn remove(&self, key: StorageKey) -> Result<(), StoreError>;
}
