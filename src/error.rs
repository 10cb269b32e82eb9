//! Error types shared across the popup controller

use std::path::PathBuf;
use thiserror::Error;

use crate::{messaging::TabId, state::Feature};

/// Key-value store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store file {0} does not hold a JSON object")]
    NotAnObject(PathBuf),

    #[error("Failed to lock store: {0}")]
    Lock(String),
}

/// Content-script notification failures. Logged, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagingError {
    #[error("No active tab found")]
    NoActiveTab,

    #[error("Could not establish connection: no listener in tab {0}")]
    NoListener(TabId),

    #[error("Tab bridge is closed")]
    Closed,
}

/// Developer settings field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    CountdownDuration,
    AutoTurnOnTime,
}

impl SettingsField {
    /// Label used in the user-facing alert
    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::CountdownDuration => "Countdown duration",
            SettingsField::AutoTurnOnTime => "Auto turn-on time",
        }
    }
}

/// Rejected developer settings input. The message is the alert shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{} must be between {min} and {max} minutes", .field.label())]
    OutOfRange {
        field: SettingsField,
        value: i64,
        min: u32,
        max: u32,
    },
}

/// Errors surfaced by the toggle state controller and its event loop
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Feature {} cannot change while blocking is off", .0.as_str())]
    FeaturesSuspended(Feature),

    #[error("Popup is closed")]
    PopupClosed,
}
