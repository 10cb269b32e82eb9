//! Auto re-enable countdown

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

/// Whether the countdown is ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Stopped,
    Running,
}

/// Source of the one-second ticks. Starting replaces any previous tick
/// source rather than adding a second one.
pub trait TickScheduler: Send {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Remaining time and the wall-clock instant the countdown ends at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    pub remaining_seconds: u64,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub end_timestamp: Option<DateTime<Utc>>,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown is stopped; nothing happened
    Idle,
    /// One second elapsed, this many remain
    Counting(u64),
    /// The countdown reached zero
    Expired,
}

/// Format seconds as `m:ss`
pub fn format_clock(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Decrementing countdown with an injected tick source.
///
/// The displayed time always comes from `remaining_seconds`, never from
/// wall-clock elapsed time. The wall clock is only consulted when the
/// countdown starts (to compute the end instant) and when it is restored
/// after the popup reopens.
pub struct CountdownTimer {
    phase: TimerPhase,
    state: CountdownState,
    duration_seconds: u64,
    scheduler: Box<dyn TickScheduler>,
}

impl CountdownTimer {
    pub fn new(duration_seconds: u64, scheduler: Box<dyn TickScheduler>) -> Self {
        Self {
            phase: TimerPhase::Stopped,
            state: CountdownState {
                remaining_seconds: duration_seconds,
                end_timestamp: None,
            },
            duration_seconds,
            scheduler,
        }
    }

    /// Start a full-length countdown and return its end instant
    pub fn start(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.state.remaining_seconds = self.duration_seconds;
        let end = now + Duration::seconds(self.state.remaining_seconds as i64);
        self.run_until(end);
        end
    }

    /// Resume a countdown persisted by an earlier popup.
    ///
    /// Returns the restored remaining seconds, or `None` if `end` has already
    /// passed, in which case the timer stays stopped.
    pub fn resume(&mut self, end: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
        let left_ms = (end - now).num_milliseconds().max(0);
        let remaining = (left_ms / 1000) as u64;
        if remaining == 0 {
            return None;
        }

        self.state.remaining_seconds = remaining;
        self.run_until(end);
        Some(remaining)
    }

    fn run_until(&mut self, end: DateTime<Utc>) {
        self.state.end_timestamp = Some(end);
        self.phase = TimerPhase::Running;
        self.scheduler.start();
        debug!("Countdown running, {} left", self.display());
    }

    /// Stop ticking and rewind to the configured duration
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.phase = TimerPhase::Stopped;
        self.state = CountdownState {
            remaining_seconds: self.duration_seconds,
            end_timestamp: None,
        };
    }

    /// Advance by one second
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase == TimerPhase::Stopped {
            return TickOutcome::Idle;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Counting(self.state.remaining_seconds)
        }
    }

    /// Change the length of future countdowns. A running countdown keeps its
    /// current end instant.
    pub fn set_duration(&mut self, duration_seconds: u64) {
        self.duration_seconds = duration_seconds;
        if self.phase == TimerPhase::Stopped {
            self.state.remaining_seconds = duration_seconds;
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn display(&self) -> String {
        format_clock(self.state.remaining_seconds)
    }
}

impl std::fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("duration_seconds", &self.duration_seconds)
            .field("scheduler_running", &self.scheduler.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualTicker;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn clock_format_pads_seconds() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn start_sets_end_and_runs() {
        let ticker = ManualTicker::new();
        let mut timer = CountdownTimer::new(120, Box::new(ticker.clone()));

        let end = timer.start(at(0));
        assert_eq!(end, at(120));
        assert_eq!(timer.phase(), TimerPhase::Running);
        assert_eq!(timer.state().end_timestamp, Some(at(120)));
        assert!(ticker.is_running());
    }

    #[test]
    fn restarting_replaces_the_tick_source() {
        let ticker = ManualTicker::new();
        let mut timer = CountdownTimer::new(60, Box::new(ticker.clone()));

        timer.start(at(0));
        timer.start(at(5));
        assert_eq!(ticker.starts(), 2);
        assert_eq!(ticker.live_sources(), 1);
    }

    #[test]
    fn ticks_count_down_to_expiry() {
        let mut timer = CountdownTimer::new(3, Box::new(ManualTicker::new()));
        assert_eq!(timer.tick(), TickOutcome::Idle);

        timer.start(at(0));
        assert_eq!(timer.tick(), TickOutcome::Counting(2));
        assert_eq!(timer.display(), "0:02");
        assert_eq!(timer.tick(), TickOutcome::Counting(1));
        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn stop_rewinds_to_duration() {
        let ticker = ManualTicker::new();
        let mut timer = CountdownTimer::new(600, Box::new(ticker.clone()));
        timer.start(at(0));
        timer.tick();

        timer.stop();
        assert_eq!(timer.phase(), TimerPhase::Stopped);
        assert_eq!(timer.remaining_seconds(), 600);
        assert_eq!(timer.state().end_timestamp, None);
        assert!(!ticker.is_running());
    }

    #[test]
    fn resume_recomputes_from_end_instant() {
        let mut timer = CountdownTimer::new(600, Box::new(ManualTicker::new()));
        let remaining = timer.resume(at(120), at(30));
        assert_eq!(remaining, Some(90));
        assert!(timer.is_running());
        assert_eq!(timer.display(), "1:30");
    }

    #[test]
    fn resume_after_end_stays_stopped() {
        let ticker = ManualTicker::new();
        let mut timer = CountdownTimer::new(600, Box::new(ticker.clone()));
        assert_eq!(timer.resume(at(10), at(10)), None);
        assert_eq!(timer.resume(at(10), at(500)), None);
        assert!(!timer.is_running());
        assert_eq!(ticker.starts(), 0);
    }

    #[test]
    fn new_duration_applies_to_stopped_timer_only() {
        let mut timer = CountdownTimer::new(600, Box::new(ManualTicker::new()));
        timer.set_duration(300);
        assert_eq!(timer.remaining_seconds(), 300);

        timer.start(at(0));
        timer.set_duration(60);
        assert_eq!(timer.remaining_seconds(), 300);

        timer.stop();
        assert_eq!(timer.remaining_seconds(), 60);
    }
}
