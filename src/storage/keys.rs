//! Storage keys and read snapshots

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every key the popup reads or writes in the extension's local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageKey {
    Enabled,
    HideShorts,
    HideFeed,
    HideComments,
    MotivationEnabled,
    Initialized,
    CountdownEndTime,
    CountdownDuration,
    AutoTurnOnTime,
    DevUnlocked,
}

impl StorageKey {
    pub const ALL: [StorageKey; 10] = [
        StorageKey::Enabled,
        StorageKey::HideShorts,
        StorageKey::HideFeed,
        StorageKey::HideComments,
        StorageKey::MotivationEnabled,
        StorageKey::Initialized,
        StorageKey::CountdownEndTime,
        StorageKey::CountdownDuration,
        StorageKey::AutoTurnOnTime,
        StorageKey::DevUnlocked,
    ];

    /// Name of the key as stored on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Enabled => "enabled",
            StorageKey::HideShorts => "hideShorts",
            StorageKey::HideFeed => "hideFeed",
            StorageKey::HideComments => "hideComments",
            StorageKey::MotivationEnabled => "motivationEnabled",
            StorageKey::Initialized => "initialized",
            StorageKey::CountdownEndTime => "countdownEndTime",
            StorageKey::CountdownDuration => "countdownDuration",
            StorageKey::AutoTurnOnTime => "autoTurnOnTime",
            StorageKey::DevUnlocked => "devUnlocked",
        }
    }
}

/// Values returned by a single read. Absent keys are simply missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    values: HashMap<StorageKey, Value>,
}

impl StoreSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: StorageKey, value: Value) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: StorageKey) -> Option<&Value> {
        self.values.get(&key)
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Boolean value, or `None` when absent or not a boolean
    pub fn get_bool(&self, key: StorageKey) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Integer value. Whole floats are accepted since browsers store numbers as doubles.
    pub fn get_i64(&self, key: StorageKey) -> Option<i64> {
        let value = self.get(key)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_names_match_serde_names() {
        for key in StorageKey::ALL {
            let encoded = serde_json::to_value(key).unwrap();
            assert_eq!(encoded, json!(key.as_str()));
        }
    }

    #[test]
    fn absent_keys_read_as_none() {
        let snapshot = StoreSnapshot::new();
        assert_eq!(snapshot.get_bool(StorageKey::Enabled), None);
        assert_eq!(snapshot.get_i64(StorageKey::CountdownEndTime), None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn integers_accept_whole_floats() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.insert(StorageKey::CountdownEndTime, json!(1_700_000_000_000.0));
        snapshot.insert(StorageKey::CountdownDuration, json!(2.5));
        assert_eq!(
            snapshot.get_i64(StorageKey::CountdownEndTime),
            Some(1_700_000_000_000)
        );
        assert_eq!(snapshot.get_i64(StorageKey::CountdownDuration), None);
    }

    #[test]
    fn wrongly_typed_bool_is_ignored() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.insert(StorageKey::Enabled, json!("false"));
        assert_eq!(snapshot.get_bool(StorageKey::Enabled), None);
        assert!(snapshot.contains(StorageKey::Enabled));
    }
}
