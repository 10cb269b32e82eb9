//! Popup event loop
//!
//! The controller is owned by a single task that processes one event at a
//! time: intents from the view layer and ticks from the countdown. Each
//! handler runs to completion before the next event is received, so the
//! controller needs no locking.

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

use super::ticker::IntervalTicker;
use crate::{
    error::ControllerError,
    messaging::TabMessenger,
    state::{
        Collaborators, DeveloperSettings, ExtensionState, Feature, PopupSnapshot,
        ToggleStateController, UnlockProgress,
    },
    storage::KeyValueStore,
    utils::Clock,
};

/// Everything the event loop reacts to
#[derive(Debug)]
pub enum PopupEvent {
    /// Click on the main toggle
    MainToggleClicked {
        reply: oneshot::Sender<ExtensionState>,
    },
    /// Change on the extension checkbox in the menu
    ActiveChanged {
        active: bool,
        reply: oneshot::Sender<ExtensionState>,
    },
    /// Change on a feature checkbox
    FeatureChanged {
        feature: Feature,
        enabled: bool,
        reply: oneshot::Sender<Result<ExtensionState, ControllerError>>,
    },
    /// Click on the hidden developer control
    DeveloperUnlockClicked {
        reply: oneshot::Sender<UnlockProgress>,
    },
    /// Click on "Save Settings"
    SettingsSaved {
        countdown_duration_minutes: i64,
        auto_turn_on_time_minutes: i64,
        reply: oneshot::Sender<Result<DeveloperSettings, ControllerError>>,
    },
    /// One second of countdown elapsed
    CountdownTick,
    /// The popup is closing
    Close,
}

/// Run the event loop until the popup closes. Dropping the controller on the
/// way out releases the countdown task; the persisted end time stays.
pub async fn popup_event_loop(
    mut controller: ToggleStateController,
    mut events: mpsc::UnboundedReceiver<PopupEvent>,
) {
    info!("Starting popup event loop");

    while let Some(event) = events.recv().await {
        if matches!(event, PopupEvent::Close) {
            info!("Popup closing");
            break;
        }
        handle_event(&mut controller, event);
    }

    info!("Popup event loop stopped");
}

fn handle_event(controller: &mut ToggleStateController, event: PopupEvent) {
    match event {
        PopupEvent::MainToggleClicked { reply } => {
            respond(reply, controller.toggle());
        }
        PopupEvent::ActiveChanged { active, reply } => {
            respond(reply, controller.set_active(active));
        }
        PopupEvent::FeatureChanged {
            feature,
            enabled,
            reply,
        } => {
            respond(reply, controller.set_feature(feature, enabled));
        }
        PopupEvent::DeveloperUnlockClicked { reply } => {
            respond(reply, controller.click_developer_unlock());
        }
        PopupEvent::SettingsSaved {
            countdown_duration_minutes,
            auto_turn_on_time_minutes,
            reply,
        } => {
            respond(
                reply,
                controller
                    .save_developer_settings(countdown_duration_minutes, auto_turn_on_time_minutes),
            );
        }
        PopupEvent::CountdownTick => {
            controller.tick();
        }
        PopupEvent::Close => {}
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("Intent sender went away before the reply");
    }
}

/// Cloneable handle used by the view layer to raise intents and read the
/// latest snapshot
#[derive(Debug, Clone)]
pub struct PopupHandle {
    events: mpsc::UnboundedSender<PopupEvent>,
    snapshots: watch::Receiver<PopupSnapshot>,
}

impl PopupHandle {
    pub fn new(
        events: mpsc::UnboundedSender<PopupEvent>,
        snapshots: watch::Receiver<PopupSnapshot>,
    ) -> Self {
        Self { events, snapshots }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> PopupEvent,
    ) -> Result<T, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(make(reply))
            .map_err(|_| ControllerError::PopupClosed)?;
        response.await.map_err(|_| ControllerError::PopupClosed)
    }

    pub async fn toggle(&self) -> Result<ExtensionState, ControllerError> {
        self.request(|reply| PopupEvent::MainToggleClicked { reply })
            .await
    }

    pub async fn set_active(&self, active: bool) -> Result<ExtensionState, ControllerError> {
        self.request(|reply| PopupEvent::ActiveChanged { active, reply })
            .await
    }

    pub async fn set_feature(
        &self,
        feature: Feature,
        enabled: bool,
    ) -> Result<ExtensionState, ControllerError> {
        self.request(|reply| PopupEvent::FeatureChanged {
            feature,
            enabled,
            reply,
        })
        .await?
    }

    pub async fn click_developer_unlock(&self) -> Result<UnlockProgress, ControllerError> {
        self.request(|reply| PopupEvent::DeveloperUnlockClicked { reply })
            .await
    }

    pub async fn save_developer_settings(
        &self,
        countdown_duration_minutes: i64,
        auto_turn_on_time_minutes: i64,
    ) -> Result<DeveloperSettings, ControllerError> {
        self.request(|reply| PopupEvent::SettingsSaved {
            countdown_duration_minutes,
            auto_turn_on_time_minutes,
            reply,
        })
        .await?
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PopupSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver for snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<PopupSnapshot> {
        self.snapshots.clone()
    }

    /// Ask the event loop to shut down
    pub fn close(&self) {
        if self.events.send(PopupEvent::Close).is_err() {
            debug!("Popup event loop already stopped");
        }
    }
}

/// Open the popup: build the controller around the given collaborators, load
/// persisted state, and spawn the event loop.
pub fn launch(
    store: Box<dyn KeyValueStore>,
    messenger: Box<dyn TabMessenger>,
    clock: Arc<dyn Clock>,
) -> Result<(PopupHandle, JoinHandle<()>), ControllerError> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let mut controller = ToggleStateController::new(Collaborators {
        store,
        messenger,
        scheduler: Box::new(IntervalTicker::new(events_tx.clone())),
        clock,
    });
    controller.load_initial()?;

    let handle = PopupHandle::new(events_tx, controller.subscribe());
    let task = tokio::spawn(popup_event_loop(controller, events_rx));
    Ok((handle, task))
}
