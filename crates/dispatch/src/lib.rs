//! Campaign dispatch engine.
//!
//! One [`Dispatcher::dispatch`] call sends every pending message of a
//! campaign through a bounded pool of workers, records each outcome on its
//! message row, and wraps the whole run in a job record that always reaches
//! a terminal state.

pub mod dispatcher;
pub mod job;
pub mod worker;

pub use dispatcher::{DispatchMode, DispatchSettings, Dispatcher};
pub use job::JobTracker;
