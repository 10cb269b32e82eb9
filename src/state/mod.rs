//! State management module
//!
//! Pure popup state: the persisted extension flags, the countdown, the
//! developer settings, and the controller that ties them together.

pub mod controller;
pub mod countdown;
pub mod developer_settings;
pub mod elapsed;
pub mod extension_state;
pub mod snapshot;

// Re-export main types
pub use controller::{Collaborators, ToggleStateController};
pub use countdown::{
    format_clock, CountdownState, CountdownTimer, TickOutcome, TickScheduler, TimerPhase,
};
pub use developer_settings::{
    DeveloperSettings, UnlockGesture, UnlockProgress, DEFAULT_AUTO_TURN_ON_MINUTES,
    DEFAULT_COUNTDOWN_MINUTES, MAX_MINUTES, MIN_MINUTES, UNLOCK_CLICKS,
};
pub use elapsed::ElapsedClock;
pub use extension_state::{ExtensionState, Feature};
pub use snapshot::{CountdownView, DeveloperView, PopupSnapshot};
