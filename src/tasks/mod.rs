//! Background tasks module
//!
//! The popup event loop that owns the controller, and the interval task that
//! drives the countdown.

pub mod event_loop;
pub mod ticker;

// Re-export main types
pub use event_loop::{launch, popup_event_loop, PopupEvent, PopupHandle};
pub use ticker::IntervalTicker;
