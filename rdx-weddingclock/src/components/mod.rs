//! Contains the building blocks the engine drives on a timer.
//!
//! The countdown and petal shower are public components in their own
//! modules; the watchers here are internal helpers the engine owns.

pub mod watcher;
