//! The countdown to a single fixed target instant.
//!
//! [`CountdownState::between`] is the pure decomposition. [`Countdown`] wraps
//! it in a [`PeriodicTask`] that re-derives the readout from the clock on
//! every tick, so there is no accumulated drift and nothing to correct.

use crate::events::CountdownEvent;
use crate::time::{Clock, PeriodicTask};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Remaining time until the target, split into whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CountdownState {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownState {
    /// Decomposes `max(0, target - now)`, truncated to whole seconds.
    pub fn between(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let delta = (target - now).num_milliseconds();
        if delta <= 0 {
            return Self::default();
        }
        Self {
            days: (delta / MS_PER_DAY) as u64,
            hours: ((delta % MS_PER_DAY) / MS_PER_HOUR) as u64,
            minutes: ((delta % MS_PER_HOUR) / MS_PER_MINUTE) as u64,
            seconds: ((delta % MS_PER_MINUTE) / MS_PER_SECOND) as u64,
        }
    }

    pub fn total_millis(&self) -> u64 {
        self.days * MS_PER_DAY as u64
            + self.hours * MS_PER_HOUR as u64
            + self.minutes * MS_PER_MINUTE as u64
            + self.seconds * MS_PER_SECOND as u64
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for CountdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Where a [`Countdown`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    Idle,
    Running,
    Stopped,
}

/// A self-updating countdown readout.
///
/// `Idle -> Running -> Stopped`, with no way back. Dropping a running
/// countdown stops its timer.
pub struct Countdown {
    target: DateTime<Utc>,
    tick_interval: Duration,
    clock: Arc<dyn Clock>,
    phase: CountdownPhase,
    readout_tx: Option<watch::Sender<CountdownState>>,
    readout_rx: watch::Receiver<CountdownState>,
    event_sender: broadcast::Sender<CountdownEvent>,
    task: Option<PeriodicTask>,
}

impl Countdown {
    pub fn new(target: DateTime<Utc>, tick_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let (event_sender, _) = broadcast::channel(64);
        Self::with_event_sender(target, tick_interval, clock, event_sender)
    }

    /// Like [`Countdown::new`], but publishes onto an existing event channel.
    pub fn with_event_sender(
        target: DateTime<Utc>,
        tick_interval: Duration,
        clock: Arc<dyn Clock>,
        event_sender: broadcast::Sender<CountdownEvent>,
    ) -> Self {
        let (readout_tx, readout_rx) = watch::channel(CountdownState::default());
        Self {
            target,
            tick_interval,
            clock,
            phase: CountdownPhase::Idle,
            readout_tx: Some(readout_tx),
            readout_rx,
            event_sender,
            task: None,
        }
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.target
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    /// The most recently published readout. All-zero until the first tick.
    pub fn readout(&self) -> CountdownState {
        *self.readout_rx.borrow()
    }

    /// A receiver that sees every published readout.
    pub fn watch(&self) -> watch::Receiver<CountdownState> {
        self.readout_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CountdownEvent> {
        self.event_sender.subscribe()
    }

    /// Starts ticking. Returns `false` if the countdown was not idle.
    pub fn start(&mut self) -> bool {
        if self.phase != CountdownPhase::Idle {
            return false;
        }
        let Some(readout_tx) = self.readout_tx.take() else {
            return false;
        };

        let target = self.target;
        let clock = self.clock.clone();
        let event_sender = self.event_sender.clone();
        let mut reached = false;

        info!("Countdown to {} started ({:?} ticks).", target, self.tick_interval);
        self.task = Some(PeriodicTask::spawn(
            "countdown",
            self.tick_interval,
            move |_| {
                let state = CountdownState::between(target, clock.now());
                trace!("Countdown readout: {}", state);
                readout_tx.send_replace(state);
                event_sender.send(CountdownEvent::Tick(state)).ok();
                if state.is_zero() && !reached {
                    reached = true;
                    info!("Countdown target {} reached.", target);
                    event_sender
                        .send(CountdownEvent::TargetReached { target })
                        .ok();
                }
            },
        ));
        self.phase = CountdownPhase::Running;
        true
    }

    /// Cancels the timer. The last readout stays readable.
    pub fn stop(&mut self) {
        if self.phase == CountdownPhase::Stopped {
            return;
        }
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        self.readout_tx = None;
        self.phase = CountdownPhase::Stopped;
        debug!("Countdown to {} stopped.", self.target);
    }

    /// `true` while the timer task is alive.
    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().is_some_and(PeriodicTask::is_running)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}
