//! Time since the popup opened

use chrono::{DateTime, Utc};

use super::countdown::format_clock;

/// Always-running elapsed display. Derived from a fixed start instant and
/// independent of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedClock {
    started_at: DateTime<Utc>,
}

impl ElapsedClock {
    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    /// `m:ss` since the popup opened
    pub fn display(&self, now: DateTime<Utc>) -> String {
        format_clock(self.elapsed_seconds(now))
    }
}
