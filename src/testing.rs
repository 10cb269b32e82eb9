//! Fakes for the controller's collaborators

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    error::MessagingError,
    messaging::{ContentMessage, TabId, TabMessenger},
    state::TickScheduler,
    utils::Clock,
};

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Debug, Default)]
struct TickerLog {
    starts: usize,
    stops: usize,
    running: bool,
}

/// Tick scheduler that records calls; ticks are driven by the test
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    log: Arc<Mutex<TickerLog>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.log.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn live_sources(&self) -> usize {
        usize::from(self.log.lock().unwrap().running)
    }
}

impl TickScheduler for ManualTicker {
    fn start(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.starts += 1;
        log.running = true;
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.stops += 1;
        log.running = false;
    }

    fn is_running(&self) -> bool {
        self.log.lock().unwrap().running
    }
}

/// Messenger that records every delivery to a fixed active tab
#[derive(Debug, Clone)]
pub struct RecordingMessenger {
    active: Option<TabId>,
    failing: bool,
    sent: Arc<Mutex<Vec<(TabId, ContentMessage)>>>,
}

impl RecordingMessenger {
    pub fn with_tab(tab: TabId) -> Self {
        Self {
            active: Some(tab),
            failing: false,
            sent: Arc::default(),
        }
    }

    pub fn without_tab() -> Self {
        Self {
            active: None,
            ..Self::with_tab(TabId(0))
        }
    }

    /// Active tab whose content script never answers
    pub fn unreachable(tab: TabId) -> Self {
        Self {
            failing: true,
            ..Self::with_tab(tab)
        }
    }

    pub fn sent(&self) -> Vec<ContentMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| *message)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl TabMessenger for RecordingMessenger {
    fn active_tab(&self) -> Option<TabId> {
        self.active
    }

    fn send(&self, tab: TabId, message: &ContentMessage) -> Result<(), MessagingError> {
        if self.failing {
            return Err(MessagingError::NoListener(tab));
        }
        self.sent.lock().unwrap().push((tab, *message));
        Ok(())
    }
}
