//! Utility module
//!
//! Clock abstraction and process signal handling.

pub mod clock;
pub mod signals;

pub use clock::{Clock, SystemClock};
pub use signals::close_signal;
