//! Shared state for the HTTP view layer

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    messaging::{TabBridge, TabMessenger},
    state::{ElapsedClock, PopupSnapshot},
    tasks::PopupHandle,
    utils::Clock,
};

/// What every handler can reach: the popup handle, the tab bridge, and the
/// elapsed clock
#[derive(Clone)]
pub struct AppState {
    pub popup: PopupHandle,
    pub bridge: TabBridge,
    pub clock: Arc<dyn Clock>,
    pub elapsed: ElapsedClock,
    pub host: String,
    pub port: u16,
}

impl AppState {
    pub fn new(
        popup: PopupHandle,
        bridge: TabBridge,
        clock: Arc<dyn Clock>,
        host: String,
        port: u16,
    ) -> Self {
        let elapsed = ElapsedClock::started_at(clock.now());
        Self {
            popup,
            bridge,
            clock,
            elapsed,
            host,
            port,
        }
    }

    pub fn snapshot(&self) -> PopupSnapshot {
        self.popup.snapshot()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn elapsed_display(&self) -> String {
        self.elapsed.display(self.now())
    }

    pub fn active_tab(&self) -> Option<u32> {
        self.bridge.active_tab().map(|tab| tab.0)
    }
}
