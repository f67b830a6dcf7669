//! Simulation time and scheduling
//!
//! Everything runs on a single logical thread: the host advances a [`Clock`]
//! once per frame and dispatches whatever the [`Scheduler`] reports as due.

mod scheduler;
mod time;

pub use scheduler::{Fired, Scheduler, Token};
pub use time::{Clock, Ticker};

/// Slack used when comparing accumulated float timestamps
pub const TIME_EPSILON: f64 = 1e-9;
