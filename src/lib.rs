//! Shorts Shield - popup controller for a short-form video blocker
//!
//! This library holds the popup's state machine (master toggle, feature
//! flags, auto re-enable countdown, developer settings), its persistence and
//! content-script messaging, and a local HTTP view layer that drives it.

pub mod api;
pub mod config;
pub mod error;
pub mod messaging;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use api::{create_router, AppState};
pub use config::Config;
pub use error::ControllerError;
pub use state::{ExtensionState, Feature, ToggleStateController};
pub use tasks::{launch, PopupHandle};
pub use utils::signals::close_signal;
