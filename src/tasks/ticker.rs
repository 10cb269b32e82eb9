//! One-second tick source for the countdown

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::event_loop::PopupEvent;
use crate::state::TickScheduler;

/// Tick source backed by a tokio interval task that feeds
/// [`PopupEvent::CountdownTick`] into the popup event loop.
///
/// Owns at most one task: starting aborts the previous one, and dropping the
/// ticker (when the popup closes) aborts whatever is running.
#[derive(Debug)]
pub struct IntervalTicker {
    events: mpsc::UnboundedSender<PopupEvent>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new(events: mpsc::UnboundedSender<PopupEvent>) -> Self {
        Self::with_period(events, Duration::from_secs(1))
    }

    pub fn with_period(events: mpsc::UnboundedSender<PopupEvent>, period: Duration) -> Self {
        Self {
            events,
            period,
            task: None,
        }
    }
}

impl TickScheduler for IntervalTicker {
    fn start(&mut self) {
        self.stop();

        let events = self.events.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            // First tick one full period from now, not immediately
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if events.send(PopupEvent::CountdownTick).is_err() {
                    debug!("Popup event loop gone, stopping countdown ticks");
                    break;
                }
            }
        }));
        debug!("Countdown tick task started");
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Countdown tick task stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
