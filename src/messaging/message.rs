//! Notifications sent from the popup to the content script

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{ExtensionState, Feature};

/// Browser tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One flag change, shaped the way the content script listens for it:
/// `{ "action": "toggleShorts", "hideShorts": true }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentMessage {
    ToggleExtension {
        enabled: bool,
    },
    ToggleShorts {
        #[serde(rename = "hideShorts")]
        hide_shorts: bool,
    },
    ToggleHideFeed {
        #[serde(rename = "hideFeed")]
        hide_feed: bool,
    },
    ToggleComments {
        #[serde(rename = "hideComments")]
        hide_comments: bool,
    },
    ToggleMotivation {
        #[serde(rename = "motivationEnabled")]
        motivation_enabled: bool,
    },
}

impl ContentMessage {
    /// Message announcing a single feature flag
    pub fn for_feature(feature: Feature, value: bool) -> Self {
        match feature {
            Feature::HideShorts => ContentMessage::ToggleShorts { hide_shorts: value },
            Feature::HideFeed => ContentMessage::ToggleHideFeed { hide_feed: value },
            Feature::HideComments => ContentMessage::ToggleComments {
                hide_comments: value,
            },
            Feature::MotivationEnabled => ContentMessage::ToggleMotivation {
                motivation_enabled: value,
            },
        }
    }

    /// One message per flag, master toggle first
    pub fn for_state(state: &ExtensionState) -> Vec<Self> {
        let mut messages = vec![ContentMessage::ToggleExtension {
            enabled: state.active,
        }];
        messages.extend(
            Feature::ALL
                .iter()
                .map(|feature| Self::for_feature(*feature, state.feature(*feature))),
        );
        messages
    }

    /// Value of the `action` field
    pub fn action(&self) -> &'static str {
        match self {
            ContentMessage::ToggleExtension { .. } => "toggleExtension",
            ContentMessage::ToggleShorts { .. } => "toggleShorts",
            ContentMessage::ToggleHideFeed { .. } => "toggleHideFeed",
            ContentMessage::ToggleComments { .. } => "toggleComments",
            ContentMessage::ToggleMotivation { .. } => "toggleMotivation",
        }
    }
}
