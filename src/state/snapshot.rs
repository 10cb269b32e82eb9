//! Render model published to the view layer

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DeveloperSettings, ExtensionState, TimerPhase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownView {
    pub phase: TimerPhase,
    pub remaining_seconds: u64,
    /// `m:ss`
    pub remaining: String,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperView {
    #[serde(flatten)]
    pub settings: DeveloperSettings,
    pub unlock_clicks: u32,
    pub options_visible: bool,
}

/// Everything the popup renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupSnapshot {
    pub extension: ExtensionState,
    pub countdown: CountdownView,
    pub developer: DeveloperView,
}

impl PopupSnapshot {
    /// Status line under the main toggle
    pub fn status_text(&self) -> &'static str {
        if self.extension.active {
            "Blocked"
        } else {
            "Unblocked"
        }
    }
}
