//! Hidden developer settings and the unlock gesture

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{SettingsError, SettingsField},
    storage::{StorageKey, StoreSnapshot},
};

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 60;
pub const DEFAULT_COUNTDOWN_MINUTES: u32 = 10;
pub const DEFAULT_AUTO_TURN_ON_MINUTES: u32 = 5;
/// Clicks on the locked control needed to unlock the panel
pub const UNLOCK_CLICKS: u32 = 7;

/// Developer configuration, persisted once changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperSettings {
    pub countdown_duration_minutes: u32,
    pub auto_turn_on_time_minutes: u32,
    pub dev_unlocked: bool,
}

impl DeveloperSettings {
    /// Read settings from a snapshot. Missing or out-of-range values fall back
    /// to the defaults.
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        let minutes = |key, default| {
            snapshot
                .get_i64(key)
                .filter(|value| in_range(*value))
                .map(|value| value as u32)
                .unwrap_or(default)
        };

        Self {
            countdown_duration_minutes: minutes(
                StorageKey::CountdownDuration,
                DEFAULT_COUNTDOWN_MINUTES,
            ),
            auto_turn_on_time_minutes: minutes(
                StorageKey::AutoTurnOnTime,
                DEFAULT_AUTO_TURN_ON_MINUTES,
            ),
            dev_unlocked: snapshot.get_bool(StorageKey::DevUnlocked) == Some(true),
        }
    }

    /// Validate raw input from the settings form. Nothing is applied when
    /// either value is rejected.
    pub fn validated(
        &self,
        countdown_duration_minutes: i64,
        auto_turn_on_time_minutes: i64,
    ) -> Result<Self, SettingsError> {
        let countdown =
            check_minutes(SettingsField::CountdownDuration, countdown_duration_minutes)?;
        let auto_turn_on = check_minutes(SettingsField::AutoTurnOnTime, auto_turn_on_time_minutes)?;

        Ok(Self {
            countdown_duration_minutes: countdown,
            auto_turn_on_time_minutes: auto_turn_on,
            dev_unlocked: self.dev_unlocked,
        })
    }

    pub fn countdown_duration_seconds(&self) -> u64 {
        u64::from(self.countdown_duration_minutes) * 60
    }

    pub fn duration_entries(&self) -> Vec<(StorageKey, Value)> {
        vec![
            (
                StorageKey::CountdownDuration,
                json!(self.countdown_duration_minutes),
            ),
            (
                StorageKey::AutoTurnOnTime,
                json!(self.auto_turn_on_time_minutes),
            ),
        ]
    }
}

impl Default for DeveloperSettings {
    fn default() -> Self {
        Self {
            countdown_duration_minutes: DEFAULT_COUNTDOWN_MINUTES,
            auto_turn_on_time_minutes: DEFAULT_AUTO_TURN_ON_MINUTES,
            dev_unlocked: false,
        }
    }
}

fn in_range(minutes: i64) -> bool {
    (i64::from(MIN_MINUTES)..=i64::from(MAX_MINUTES)).contains(&minutes)
}

fn check_minutes(field: SettingsField, value: i64) -> Result<u32, SettingsError> {
    if in_range(value) {
        Ok(value as u32)
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: MIN_MINUTES,
            max: MAX_MINUTES,
        })
    }
}

/// Result of one click on the developer control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum UnlockProgress {
    /// Still locked; `clicks` of the required seven so far
    Counting { clicks: u32, required: u32 },
    /// This click unlocked the panel
    Unlocked,
    /// Already unlocked; the click toggled the options panel
    OptionsToggled { visible: bool },
}

/// Click counter for the locked control. Lives only as long as the popup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnlockGesture {
    clicks: u32,
}

impl UnlockGesture {
    /// Register a click; true once the threshold is reached
    pub fn click(&mut self) -> bool {
        self.clicks = self.clicks.saturating_add(1);
        self.clicks >= UNLOCK_CLICKS
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }
}
