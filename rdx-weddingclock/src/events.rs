//! Defines all public event types broadcast by the wedding clock.
//!
//! Listeners subscribe to these strongly-typed streams through the engine
//! (or directly on a `Countdown` / `PetalShower`) to drive their own output.

use crate::common::{EventId, PetalId};
use crate::countdown::CountdownState;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Events related to the lifecycle of the engine itself.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// Fired once when the engine's `run` loop begins.
    EngineStarted { timestamp: Instant },
    /// Fired once when the engine's `run` loop is about to exit.
    EngineShutdown,
}

/// Fired by the schedule watcher when the Now/Next pair changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEvent {
    WindowChanged {
        current: Option<EventId>,
        next: Option<EventId>,
        at: DateTime<Utc>,
    },
}

/// Events published by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// The readout was recomputed.
    Tick(CountdownState),
    /// Fired once, on the first tick that reads zero.
    TargetReached { target: DateTime<Utc> },
}

/// Events published by a petal shower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowerEvent {
    /// Emission has begun.
    Started,
    /// A petal joined the live set.
    PetalSpawned { id: PetalId },
    /// A petal finished its fall and left the live set.
    PetalLanded { id: PetalId },
    /// The emission window closed (or was cancelled); no more spawns.
    EmissionFinished { spawned: usize },
    /// Emission is over and the last live petal has landed.
    Cleared,
}
