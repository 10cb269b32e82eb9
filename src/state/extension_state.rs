//! Master toggle and feature flags

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::storage::{StorageKey, StoreSnapshot};

/// Independent blocking features, all suspended while blocking is off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    HideShorts,
    HideFeed,
    HideComments,
    MotivationEnabled,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::HideShorts,
        Feature::HideFeed,
        Feature::HideComments,
        Feature::MotivationEnabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::HideShorts => "hideShorts",
            Feature::HideFeed => "hideFeed",
            Feature::HideComments => "hideComments",
            Feature::MotivationEnabled => "motivationEnabled",
        }
    }

    /// Parse the name used in storage and in the HTTP routes
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.as_str() == name)
    }

    pub fn storage_key(&self) -> StorageKey {
        match self {
            Feature::HideShorts => StorageKey::HideShorts,
            Feature::HideFeed => StorageKey::HideFeed,
            Feature::HideComments => StorageKey::HideComments,
            Feature::MotivationEnabled => StorageKey::MotivationEnabled,
        }
    }
}

/// Persisted extension state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionState {
    /// Blocking on. When false every feature flag is false.
    pub active: bool,
    pub hide_shorts: bool,
    pub hide_feed: bool,
    pub hide_comments: bool,
    pub motivation_enabled: bool,
    /// Set once the first-run defaults have been seeded
    pub initialized: bool,
}

impl ExtensionState {
    /// Defaults written on first install
    pub fn first_run() -> Self {
        Self {
            active: true,
            hide_shorts: true,
            hide_feed: true,
            hide_comments: false,
            motivation_enabled: false,
            initialized: true,
        }
    }

    /// Read the state from a store snapshot.
    ///
    /// `enabled` and `hideShorts` count as on unless stored as `false`; the
    /// other flags count as off unless stored as `true`. The result is
    /// normalised so an inactive state never carries features.
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        let state = Self {
            active: snapshot.get_bool(StorageKey::Enabled) != Some(false),
            hide_shorts: snapshot.get_bool(StorageKey::HideShorts) != Some(false),
            hide_feed: snapshot.get_bool(StorageKey::HideFeed) == Some(true),
            hide_comments: snapshot.get_bool(StorageKey::HideComments) == Some(true),
            motivation_enabled: snapshot.get_bool(StorageKey::MotivationEnabled) == Some(true),
            initialized: snapshot.get_bool(StorageKey::Initialized) == Some(true),
        };
        state.normalized()
    }

    /// Entries written on every master toggle change
    pub fn storage_entries(&self) -> Vec<(StorageKey, Value)> {
        vec![
            (StorageKey::Enabled, json!(self.active)),
            (StorageKey::HideShorts, json!(self.hide_shorts)),
            (StorageKey::HideFeed, json!(self.hide_feed)),
            (StorageKey::HideComments, json!(self.hide_comments)),
            (StorageKey::MotivationEnabled, json!(self.motivation_enabled)),
            (StorageKey::Initialized, json!(self.initialized)),
        ]
    }

    pub fn feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::HideShorts => self.hide_shorts,
            Feature::HideFeed => self.hide_feed,
            Feature::HideComments => self.hide_comments,
            Feature::MotivationEnabled => self.motivation_enabled,
        }
    }

    pub fn set_feature(&mut self, feature: Feature, value: bool) {
        match feature {
            Feature::HideShorts => self.hide_shorts = value,
            Feature::HideFeed => self.hide_feed = value,
            Feature::HideComments => self.hide_comments = value,
            Feature::MotivationEnabled => self.motivation_enabled = value,
        }
    }

    /// Turn blocking on with the default feature set: shorts hidden, the rest off
    pub fn activate(&mut self) {
        self.active = true;
        self.hide_shorts = true;
        self.hide_feed = false;
        self.hide_comments = false;
        self.motivation_enabled = false;
    }

    /// Turn blocking off, suspending every feature
    pub fn deactivate(&mut self) {
        self.active = false;
        self.suspend_features();
    }

    fn suspend_features(&mut self) {
        for feature in Feature::ALL {
            self.set_feature(feature, false);
        }
    }

    /// Copy with the inactive invariant enforced
    pub fn normalized(mut self) -> Self {
        if !self.active {
            self.suspend_features();
        }
        self
    }

    /// Any feature flag set
    pub fn any_feature(&self) -> bool {
        Feature::ALL.iter().any(|feature| self.feature(*feature))
    }
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self::first_run()
    }
}
