//! Popup → content script messaging
//!
//! Notifications are fire-and-forget: a missing tab or a tab without a
//! listener is logged and the state change goes ahead regardless, since the
//! persisted store is the source of truth.

pub mod bridge;
pub mod message;

use tracing::{debug, warn};

use crate::error::MessagingError;

pub use bridge::{TabBridge, TabDelivery, TabListener};
pub use message::{ContentMessage, TabId};

/// Delivery side of the browser's tab messaging
pub trait TabMessenger: Send {
    /// Active tab of the current window, if there is one
    fn active_tab(&self) -> Option<TabId>;

    fn send(&self, tab: TabId, message: &ContentMessage) -> Result<(), MessagingError>;
}

/// Send `messages` to the active tab, logging every failure.
/// Returns the number of messages delivered.
pub fn notify_active_tab(messenger: &dyn TabMessenger, messages: &[ContentMessage]) -> usize {
    let Some(tab) = messenger.active_tab() else {
        warn!("{}, skipping {} notifications", MessagingError::NoActiveTab, messages.len());
        return 0;
    };

    let mut delivered = 0;
    for message in messages {
        match messenger.send(tab, message) {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Error sending {} message to tab {}: {}", message.action(), tab, e),
        }
    }

    debug!("Sent {}/{} feature messages to tab {}", delivered, messages.len(), tab);
    delivered
}
