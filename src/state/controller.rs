//! Toggle state controller
//!
//! Owns the master toggle, the feature flags, the countdown and the developer
//! settings. Every intent goes through here: the controller mutates its
//! state, persists it, notifies the content script, and publishes a new
//! snapshot for the view layer. Storage and messaging failures are logged and
//! never roll a transition back.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    countdown::{CountdownTimer, TickOutcome, TickScheduler},
    developer_settings::{DeveloperSettings, UnlockGesture, UnlockProgress, UNLOCK_CLICKS},
    extension_state::{ExtensionState, Feature},
    snapshot::{CountdownView, DeveloperView, PopupSnapshot},
};
use crate::{
    error::ControllerError,
    messaging::{notify_active_tab, ContentMessage, TabMessenger},
    storage::{KeyValueStore, StorageKey},
    utils::Clock,
};

/// Injected collaborators
pub struct Collaborators {
    pub store: Box<dyn KeyValueStore>,
    pub messenger: Box<dyn TabMessenger>,
    pub scheduler: Box<dyn TickScheduler>,
    pub clock: Arc<dyn Clock>,
}

pub struct ToggleStateController {
    state: ExtensionState,
    settings: DeveloperSettings,
    countdown: CountdownTimer,
    unlock: UnlockGesture,
    developer_options_visible: bool,
    store: Box<dyn KeyValueStore>,
    messenger: Box<dyn TabMessenger>,
    clock: Arc<dyn Clock>,
    /// Snapshot channel for the view layer
    snapshot_tx: watch::Sender<PopupSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<PopupSnapshot>,
}

impl ToggleStateController {
    /// Build a controller with default state. Call [`load_initial`] before use.
    ///
    /// [`load_initial`]: ToggleStateController::load_initial
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            messenger,
            scheduler,
            clock,
        } = collaborators;

        let settings = DeveloperSettings::default();
        let countdown = CountdownTimer::new(settings.countdown_duration_seconds(), scheduler);
        let initial = Self::render(
            &ExtensionState::default(),
            &countdown,
            &settings,
            UnlockGesture::default(),
            false,
        );
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        Self {
            state: ExtensionState::default(),
            settings,
            countdown,
            unlock: UnlockGesture::default(),
            developer_options_visible: false,
            store,
            messenger,
            clock,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    /// Load persisted state, seed first-run defaults and restore the countdown.
    ///
    /// A countdown that ended while the popup was closed re-enables blocking
    /// before anything is rendered.
    pub fn load_initial(&mut self) -> Result<PopupSnapshot, ControllerError> {
        let snapshot = self.store.get(&StorageKey::ALL)?;

        self.settings = DeveloperSettings::from_snapshot(&snapshot);
        self.countdown
            .set_duration(self.settings.countdown_duration_seconds());

        if snapshot.get_bool(StorageKey::Initialized) == Some(true) {
            self.state = ExtensionState::from_snapshot(&snapshot);
        } else {
            info!("First run, seeding default extension state");
            self.state = ExtensionState::first_run();
            self.persist(&self.state.storage_entries());
        }

        if !self.state.active {
            let end = snapshot
                .get_i64(StorageKey::CountdownEndTime)
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

            match end {
                Some(end) => {
                    let now = self.clock.now();
                    match self.countdown.resume(end, now) {
                        Some(remaining) => {
                            info!("Countdown restored: {} seconds remaining", remaining);
                        }
                        None => {
                            info!("Countdown expired while the popup was closed, re-enabling blocking");
                            self.set_active(true);
                        }
                    }
                }
                None => {
                    warn!("Blocking is off without a countdown end time, starting a new countdown");
                    self.begin_countdown();
                    self.persist(&self.state.storage_entries());
                }
            }
        }

        info!(
            "Popup loaded: active={}, countdown={:?}, dev_unlocked={}",
            self.state.active,
            self.countdown.phase(),
            self.settings.dev_unlocked
        );
        self.publish();
        Ok(self.snapshot())
    }

    /// Set the master toggle.
    ///
    /// Turning blocking off suspends every feature and starts the countdown;
    /// turning it on restores the default feature set and clears the
    /// countdown. Calling with the current value re-asserts the state without
    /// changing it. The full state is always persisted and announced.
    pub fn set_active(&mut self, active: bool) -> ExtensionState {
        match (self.state.active, active) {
            (true, false) => {
                self.state.deactivate();
                self.begin_countdown();
                info!("Blocking turned off for {}", self.countdown.display());
            }
            (false, true) => {
                self.state.activate();
                self.countdown.stop();
                self.forget(StorageKey::CountdownEndTime);
                info!("Blocking turned on");
            }
            _ => debug!("Master toggle already {}", active),
        }

        self.persist(&self.state.storage_entries());
        self.notify(&ContentMessage::for_state(&self.state));
        self.publish();
        self.state
    }

    /// Flip the master toggle, as the main button does
    pub fn toggle(&mut self) -> ExtensionState {
        self.set_active(!self.state.active)
    }

    fn begin_countdown(&mut self) {
        let end = self.countdown.start(self.clock.now());
        self.persist(&[(StorageKey::CountdownEndTime, json!(end.timestamp_millis()))]);
    }

    /// Change a single feature flag.
    ///
    /// Enabling motivation mode also turns on the feed filter; disabling it
    /// leaves the feed filter alone. Features are suspended while blocking is
    /// off, so changes are rejected then.
    pub fn set_feature(
        &mut self,
        feature: Feature,
        value: bool,
    ) -> Result<ExtensionState, ControllerError> {
        if !self.state.active {
            warn!(
                "Ignoring {} change to {} while blocking is off",
                feature.as_str(),
                value
            );
            return Err(ControllerError::FeaturesSuspended(feature));
        }

        self.state.set_feature(feature, value);
        let mut entries = vec![(feature.storage_key(), json!(value))];
        let mut messages = Vec::with_capacity(2);

        if feature == Feature::MotivationEnabled && value {
            self.state.hide_feed = true;
            entries.push((StorageKey::HideFeed, json!(true)));
            messages.push(ContentMessage::for_feature(Feature::HideFeed, true));
        }
        messages.push(ContentMessage::for_feature(feature, value));

        info!("{} toggle changed: {}", feature.as_str(), value);
        self.persist(&entries);
        self.notify(&messages);
        self.publish();
        Ok(self.state)
    }

    /// Advance the countdown by one second, re-enabling blocking at zero
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.countdown.tick();
        match outcome {
            TickOutcome::Idle => debug!("Tick ignored, countdown stopped"),
            TickOutcome::Counting(_) => self.publish(),
            TickOutcome::Expired => {
                info!("Countdown completed, re-enabling blocking");
                self.set_active(true);
            }
        }
        outcome
    }

    /// Click on the developer control. Seven clicks unlock the panel; after
    /// that each click shows or hides the options.
    pub fn click_developer_unlock(&mut self) -> UnlockProgress {
        let progress = if self.settings.dev_unlocked {
            self.developer_options_visible = !self.developer_options_visible;
            UnlockProgress::OptionsToggled {
                visible: self.developer_options_visible,
            }
        } else if self.unlock.click() {
            self.settings.dev_unlocked = true;
            self.persist(&[(StorageKey::DevUnlocked, json!(true))]);
            info!("Developer mode unlocked");
            UnlockProgress::Unlocked
        } else {
            info!(
                "Developer unlock click: {}/{}",
                self.unlock.clicks(),
                UNLOCK_CLICKS
            );
            UnlockProgress::Counting {
                clicks: self.unlock.clicks(),
                required: UNLOCK_CLICKS,
            }
        };

        self.publish();
        progress
    }

    /// Validate and save developer settings.
    ///
    /// A stopped countdown picks up the new duration immediately; a running
    /// one keeps its end time and the new duration applies next cycle.
    pub fn save_developer_settings(
        &mut self,
        countdown_duration_minutes: i64,
        auto_turn_on_time_minutes: i64,
    ) -> Result<DeveloperSettings, ControllerError> {
        let settings = self
            .settings
            .validated(countdown_duration_minutes, auto_turn_on_time_minutes)
            .inspect_err(|e| warn!("Rejected developer settings: {}", e))?;

        self.settings = settings;
        self.persist(&settings.duration_entries());
        self.countdown
            .set_duration(settings.countdown_duration_seconds());

        info!(
            "Developer settings saved: countdown={}min, auto_turn_on={}min",
            settings.countdown_duration_minutes, settings.auto_turn_on_time_minutes
        );
        self.publish();
        Ok(settings)
    }

    pub fn state(&self) -> ExtensionState {
        self.state
    }

    pub fn settings(&self) -> DeveloperSettings {
        self.settings
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.countdown
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<PopupSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> PopupSnapshot {
        Self::render(
            &self.state,
            &self.countdown,
            &self.settings,
            self.unlock,
            self.developer_options_visible,
        )
    }

    fn render(
        state: &ExtensionState,
        countdown: &CountdownTimer,
        settings: &DeveloperSettings,
        unlock: UnlockGesture,
        options_visible: bool,
    ) -> PopupSnapshot {
        let countdown_state = countdown.state();
        PopupSnapshot {
            extension: *state,
            countdown: CountdownView {
                phase: countdown.phase(),
                remaining_seconds: countdown_state.remaining_seconds,
                remaining: countdown.display(),
                end_time: countdown_state.end_timestamp,
            },
            developer: DeveloperView {
                settings: *settings,
                unlock_clicks: unlock.clicks(),
                options_visible,
            },
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn persist(&self, entries: &[(StorageKey, Value)]) {
        if let Err(e) = self.store.set(entries) {
            warn!("Failed to persist {} keys: {}", entries.len(), e);
        }
    }

    fn forget(&self, key: StorageKey) {
        if let Err(e) = self.store.remove(key) {
            warn!("Failed to remove {}: {}", key.as_str(), e);
        }
    }

    fn notify(&self, messages: &[ContentMessage]) {
        notify_active_tab(self.messenger.as_ref(), messages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        messaging::TabId,
        state::{TimerPhase, MAX_MINUTES},
        storage::MemoryStore,
        testing::{ManualClock, ManualTicker, RecordingMessenger},
    };
    use chrono::Duration;

    struct Harness {
        controller: ToggleStateController,
        store: MemoryStore,
        messenger: RecordingMessenger,
        ticker: ManualTicker,
        clock: ManualClock,
    }

    fn open_popup(store: MemoryStore, clock: ManualClock) -> Harness {
        let messenger = RecordingMessenger::with_tab(TabId(1));
        let ticker = ManualTicker::new();
        let mut controller = ToggleStateController::new(Collaborators {
            store: Box::new(store.clone()),
            messenger: Box::new(messenger.clone()),
            scheduler: Box::new(ticker.clone()),
            clock: Arc::new(clock.clone()),
        });
        controller.load_initial().unwrap();
        Harness {
            controller,
            store,
            messenger,
            ticker,
            clock,
        }
    }

    fn fresh_popup() -> Harness {
        open_popup(MemoryStore::new(), ManualClock::new())
    }

    fn assert_invariant(state: &ExtensionState) {
        if !state.active {
            assert!(!state.any_feature(), "features leaked while inactive: {:?}", state);
        }
    }

    // --- load_initial ---

    #[test]
    fn first_run_seeds_defaults() {
        let h = fresh_popup();
        assert_eq!(h.controller.state(), ExtensionState::first_run());
        assert_eq!(h.store.peek(StorageKey::Initialized), Some(json!(true)));
        assert_eq!(h.store.peek(StorageKey::HideFeed), Some(json!(true)));
        assert_eq!(h.controller.countdown().phase(), TimerPhase::Stopped);
    }

    #[test]
    fn persisted_state_round_trips() {
        let h = fresh_popup();
        let mut controller = h.controller;
        controller.set_feature(Feature::HideComments, true).unwrap();
        controller.set_feature(Feature::HideShorts, false).unwrap();
        let before = controller.state();
        drop(controller);

        let reopened = open_popup(h.store.clone(), h.clock.clone());
        assert_eq!(reopened.controller.state(), before);
    }

    #[test]
    fn inactive_state_round_trips_with_countdown() {
        let mut h = fresh_popup();
        h.controller.set_active(false);
        let before = h.controller.state();

        let reopened = open_popup(h.store.clone(), h.clock.clone());
        assert_eq!(reopened.controller.state(), before);
        assert!(reopened.controller.countdown().is_running());
    }

    #[test]
    fn countdown_restores_after_reopen() {
        let clock = ManualClock::new();
        let end = clock.now() + Duration::milliseconds(120_000);
        let store = MemoryStore::with_entries(&[
            (StorageKey::Initialized, json!(true)),
            (StorageKey::Enabled, json!(false)),
            (StorageKey::CountdownEndTime, json!(end.timestamp_millis())),
        ]);
        clock.advance(Duration::seconds(30));

        let h = open_popup(store, clock);
        let remaining = h.controller.countdown().remaining_seconds();
        assert!((89..=91).contains(&remaining), "remaining was {}", remaining);
        assert!(!h.controller.state().active);
        assert_eq!(h.ticker.live_sources(), 1);
    }

    #[test]
    fn expired_countdown_reactivates_on_load() {
        let clock = ManualClock::new();
        let end = clock.now() - Duration::seconds(5);
        let store = MemoryStore::with_entries(&[
            (StorageKey::Initialized, json!(true)),
            (StorageKey::Enabled, json!(false)),
            (StorageKey::CountdownEndTime, json!(end.timestamp_millis())),
        ]);

        let h = open_popup(store, clock);
        assert!(h.controller.state().active);
        assert!(h.controller.state().hide_shorts);
        assert_eq!(h.store.peek(StorageKey::CountdownEndTime), None);
        assert_eq!(h.store.peek(StorageKey::Enabled), Some(json!(true)));
        assert_eq!(h.controller.countdown().phase(), TimerPhase::Stopped);
    }

    #[test]
    fn inactive_without_end_time_starts_fresh_countdown() {
        let store = MemoryStore::with_entries(&[
            (StorageKey::Initialized, json!(true)),
            (StorageKey::Enabled, json!(false)),
            (StorageKey::CountdownDuration, json!(2)),
        ]);
        let h = open_popup(store, ManualClock::new());
        assert!(h.controller.countdown().is_running());
        assert_eq!(h.controller.countdown().remaining_seconds(), 120);
        assert!(h.store.peek(StorageKey::CountdownEndTime).is_some());
    }

    // --- set_active ---

    #[test]
    fn deactivating_suspends_features_and_starts_countdown() {
        let mut h = fresh_popup();
        let now = h.clock.now();
        let state = h.controller.set_active(false);

        assert!(!state.active);
        assert_invariant(&state);
        assert!(h.controller.countdown().is_running());
        assert_eq!(h.controller.countdown().remaining_seconds(), 600);
        assert_eq!(
            h.store.peek(StorageKey::CountdownEndTime),
            Some(json!((now + Duration::seconds(600)).timestamp_millis()))
        );
        assert_eq!(h.store.peek(StorageKey::Enabled), Some(json!(false)));
        assert_eq!(h.store.peek(StorageKey::HideShorts), Some(json!(false)));
    }

    #[test]
    fn reactivating_restores_default_features() {
        let mut h = fresh_popup();
        h.controller.set_feature(Feature::HideComments, true).unwrap();
        h.controller.set_active(false);
        let state = h.controller.set_active(true);

        assert!(state.active);
        assert!(state.hide_shorts);
        assert!(!state.hide_feed);
        assert!(!state.hide_comments);
        assert_eq!(h.store.peek(StorageKey::CountdownEndTime), None);
        assert_eq!(h.controller.countdown().phase(), TimerPhase::Stopped);
        assert_eq!(h.ticker.live_sources(), 0);
        assert_eq!(h.ticker.stops(), 1);
    }

    #[test]
    fn invariant_holds_across_toggle_sequences() {
        let mut h = fresh_popup();
        for active in [false, false, true, false, true, true, false] {
            let state = h.controller.set_active(active);
            assert_invariant(&state);
            assert_eq!(state.active, active);
        }
        let state = h.controller.toggle();
        assert!(state.active && state.hide_shorts);
    }

    #[test]
    fn activating_twice_is_idempotent() {
        let mut h = fresh_popup();
        h.controller.set_active(false);
        let first = h.controller.set_active(true);
        let second = h.controller.set_active(true);
        assert_eq!(first, second);
    }

    #[test]
    fn every_toggle_notifies_each_flag() {
        let mut h = fresh_popup();
        h.messenger.clear();
        h.controller.set_active(false);

        assert_eq!(
            h.messenger.sent(),
            vec![
                ContentMessage::ToggleExtension { enabled: false },
                ContentMessage::ToggleShorts { hide_shorts: false },
                ContentMessage::ToggleHideFeed { hide_feed: false },
                ContentMessage::ToggleComments { hide_comments: false },
                ContentMessage::ToggleMotivation {
                    motivation_enabled: false
                },
            ]
        );
    }

    #[test]
    fn messaging_failures_do_not_block_state_changes() {
        let store = MemoryStore::new();
        let mut controller = ToggleStateController::new(Collaborators {
            store: Box::new(store.clone()),
            messenger: Box::new(RecordingMessenger::unreachable(TabId(9))),
            scheduler: Box::new(ManualTicker::new()),
            clock: Arc::new(ManualClock::new()),
        });
        controller.load_initial().unwrap();

        let state = controller.set_active(false);
        assert!(!state.active);
        assert_eq!(store.peek(StorageKey::Enabled), Some(json!(false)));
    }

    #[test]
    fn missing_tab_skips_notifications() {
        let messenger = RecordingMessenger::without_tab();
        let mut controller = ToggleStateController::new(Collaborators {
            store: Box::new(MemoryStore::new()),
            messenger: Box::new(messenger.clone()),
            scheduler: Box::new(ManualTicker::new()),
            clock: Arc::new(ManualClock::new()),
        });
        controller.load_initial().unwrap();
        controller.set_active(false);
        assert!(messenger.sent().is_empty());
    }

    // --- set_feature ---

    #[test]
    fn enabling_motivation_forces_feed_filter() {
        let mut h = fresh_popup();
        h.controller.set_feature(Feature::HideFeed, false).unwrap();
        h.messenger.clear();

        let state = h.controller.set_feature(Feature::MotivationEnabled, true).unwrap();
        assert!(state.motivation_enabled);
        assert!(state.hide_feed);
        assert_eq!(h.store.peek(StorageKey::HideFeed), Some(json!(true)));
        assert_eq!(
            h.messenger.sent(),
            vec![
                ContentMessage::ToggleHideFeed { hide_feed: true },
                ContentMessage::ToggleMotivation {
                    motivation_enabled: true
                },
            ]
        );
    }

    #[test]
    fn disabling_motivation_keeps_feed_filter() {
        let mut h = fresh_popup();
        h.controller.set_feature(Feature::MotivationEnabled, true).unwrap();
        let state = h.controller.set_feature(Feature::MotivationEnabled, false).unwrap();
        assert!(!state.motivation_enabled);
        assert!(state.hide_feed);
    }

    #[test]
    fn features_are_rejected_while_inactive() {
        let mut h = fresh_popup();
        h.controller.set_active(false);
        let result = h.controller.set_feature(Feature::HideComments, true);
        assert!(matches!(
            result,
            Err(ControllerError::FeaturesSuspended(Feature::HideComments))
        ));
        assert_invariant(&h.controller.state());
        assert_eq!(h.store.peek(StorageKey::HideComments), Some(json!(false)));
    }

    // --- countdown ticks ---

    #[test]
    fn countdown_expiry_reactivates_and_resets() {
        let store = MemoryStore::with_entries(&[(StorageKey::CountdownDuration, json!(1))]);
        let mut h = open_popup(store, ManualClock::new());
        h.controller.set_active(false);

        for expected in (1..60).rev() {
            assert_eq!(h.controller.tick(), TickOutcome::Counting(expected));
        }
        assert_eq!(h.controller.snapshot().countdown.remaining, "0:01");
        assert_eq!(h.controller.tick(), TickOutcome::Expired);

        assert!(h.controller.state().active);
        assert!(h.controller.state().hide_shorts);
        assert_eq!(h.controller.countdown().remaining_seconds(), 60);
        assert_eq!(h.controller.tick(), TickOutcome::Idle);
        assert_eq!(h.store.peek(StorageKey::CountdownEndTime), None);
    }

    #[test]
    fn ticks_publish_snapshots() {
        let mut h = fresh_popup();
        let mut rx = h.controller.subscribe();
        h.controller.set_active(false);
        h.controller.tick();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.countdown.remaining, "9:59");
        assert_eq!(snapshot.status_text(), "Unblocked");
    }

    // --- developer settings ---

    #[test]
    fn seven_clicks_unlock_developer_mode() {
        let mut h = fresh_popup();
        for click in 1..UNLOCK_CLICKS {
            assert_eq!(
                h.controller.click_developer_unlock(),
                UnlockProgress::Counting {
                    clicks: click,
                    required: UNLOCK_CLICKS
                }
            );
            assert_eq!(h.store.peek(StorageKey::DevUnlocked), None);
        }

        assert_eq!(h.controller.click_developer_unlock(), UnlockProgress::Unlocked);
        assert_eq!(h.store.peek(StorageKey::DevUnlocked), Some(json!(true)));
        assert!(h.controller.settings().dev_unlocked);

        assert_eq!(
            h.controller.click_developer_unlock(),
            UnlockProgress::OptionsToggled { visible: true }
        );
        assert_eq!(
            h.controller.click_developer_unlock(),
            UnlockProgress::OptionsToggled { visible: false }
        );
    }

    #[test]
    fn unlock_persists_across_reopen() {
        let mut h = fresh_popup();
        for _ in 0..UNLOCK_CLICKS {
            h.controller.click_developer_unlock();
        }
        let reopened = open_popup(h.store.clone(), h.clock.clone());
        assert!(reopened.controller.settings().dev_unlocked);
    }

    #[test]
    fn saving_settings_updates_stopped_countdown() {
        let mut h = fresh_popup();
        let settings = h.controller.save_developer_settings(3, 7).unwrap();
        assert_eq!(settings.countdown_duration_minutes, 3);
        assert_eq!(h.controller.countdown().remaining_seconds(), 180);
        assert_eq!(h.store.peek(StorageKey::CountdownDuration), Some(json!(3)));
        assert_eq!(h.store.peek(StorageKey::AutoTurnOnTime), Some(json!(7)));

        h.controller.set_active(false);
        assert_eq!(h.controller.countdown().remaining_seconds(), 180);
    }

    #[test]
    fn saving_settings_keeps_running_countdown() {
        let mut h = fresh_popup();
        h.controller.set_active(false);
        h.controller.tick();

        h.controller.save_developer_settings(1, 5).unwrap();
        assert_eq!(h.controller.countdown().remaining_seconds(), 599);

        h.controller.set_active(true);
        assert_eq!(h.controller.countdown().remaining_seconds(), 60);
    }

    #[test]
    fn invalid_settings_mutate_nothing() {
        let mut h = fresh_popup();
        let before = h.controller.settings();

        let result = h
            .controller
            .save_developer_settings(i64::from(MAX_MINUTES) + 1, 5);
        assert!(matches!(result, Err(ControllerError::Settings(_))));
        let result = h.controller.save_developer_settings(10, -1);
        assert!(matches!(result, Err(ControllerError::Settings(_))));

        assert_eq!(h.controller.settings(), before);
        assert_eq!(h.store.peek(StorageKey::CountdownDuration), None);
        assert_eq!(h.controller.countdown().remaining_seconds(), 600);
    }
}
