//! In-process tab bridge
//!
//! Stands in for the browser's `tabs` API. Content scripts connect as
//! listeners for a tab id (over SSE in the HTTP layer), the view marks one
//! tab as focused, and the popup's notifications are fanned out on a
//! broadcast channel filtered per tab.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{debug, info, warn};

use super::{ContentMessage, TabId, TabMessenger};
use crate::error::MessagingError;

/// A message addressed to one tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabDelivery {
    pub tab: TabId,
    pub message: ContentMessage,
}

#[derive(Debug)]
struct BridgeInner {
    deliveries: broadcast::Sender<TabDelivery>,
    active: Mutex<Option<TabId>>,
    listeners: Mutex<HashMap<TabId, usize>>,
}

/// Cloneable handle to the bridge
#[derive(Debug, Clone)]
pub struct TabBridge {
    inner: Arc<BridgeInner>,
}

impl TabBridge {
    pub fn new(capacity: usize) -> Self {
        let (deliveries, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(BridgeInner {
                deliveries,
                active: Mutex::new(None),
                listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Mark `tab` as the active tab of the current window
    pub fn focus(&self, tab: TabId) {
        match self.inner.active.lock() {
            Ok(mut active) => {
                *active = Some(tab);
                info!("Tab {} is now active", tab);
            }
            Err(e) => warn!("Failed to lock active tab: {}", e),
        }
    }

    /// Forget the active tab, e.g. when the window loses focus
    pub fn blur(&self) {
        if let Ok(mut active) = self.inner.active.lock() {
            *active = None;
        }
    }

    /// Register a content-script listener for `tab`
    pub fn subscribe(&self, tab: TabId) -> TabListener {
        let receiver = self.inner.deliveries.subscribe();
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            *listeners.entry(tab).or_insert(0) += 1;
        }
        debug!("Content script listening on tab {}", tab);

        TabListener {
            guard: ListenerGuard {
                tab,
                inner: Arc::clone(&self.inner),
            },
            receiver,
        }
    }

    /// Number of live listeners for `tab`
    pub fn listener_count(&self, tab: TabId) -> usize {
        self.inner
            .listeners
            .lock()
            .map(|listeners| listeners.get(&tab).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl TabMessenger for TabBridge {
    fn active_tab(&self) -> Option<TabId> {
        self.inner.active.lock().ok().and_then(|active| *active)
    }

    fn send(&self, tab: TabId, message: &ContentMessage) -> Result<(), MessagingError> {
        if self.listener_count(tab) == 0 {
            return Err(MessagingError::NoListener(tab));
        }

        self.inner
            .deliveries
            .send(TabDelivery {
                tab,
                message: *message,
            })
            .map(|_| ())
            .map_err(|_| MessagingError::Closed)
    }
}

/// Decrements the tab's listener count when the listener goes away
#[derive(Debug)]
struct ListenerGuard {
    tab: TabId,
    inner: Arc<BridgeInner>,
}

impl ListenerGuard {
    fn accepts(&self, delivery: &TabDelivery) -> bool {
        delivery.tab == self.tab
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            if let Some(count) = listeners.get_mut(&self.tab) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    listeners.remove(&self.tab);
                }
            }
        }
        debug!("Content script on tab {} disconnected", self.tab);
    }
}

/// Receiving end for one content script
#[derive(Debug)]
pub struct TabListener {
    guard: ListenerGuard,
    receiver: broadcast::Receiver<TabDelivery>,
}

impl TabListener {
    pub fn tab(&self) -> TabId {
        self.guard.tab
    }

    /// Next message for this tab, or `None` once the bridge is gone
    pub async fn recv(&mut self) -> Option<ContentMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(delivery) if self.guard.accepts(&delivery) => return Some(delivery.message),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Tab {} listener lagged, skipped {} messages", self.guard.tab, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stream of this tab's messages. The listener stays registered until the
    /// stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = ContentMessage> + Send + 'static {
        let TabListener { guard, receiver } = self;
        BroadcastStream::new(receiver).filter_map(move |result| match result {
            Ok(delivery) if guard.accepts(&delivery) => Some(delivery.message),
            _ => None,
        })
    }
}
