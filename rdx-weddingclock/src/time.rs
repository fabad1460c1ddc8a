//! Time sources and the periodic task primitive.
//!
//! Every component reads "now" through the [`Clock`] trait rather than calling
//! `Utc::now()` directly, so tests (and the shell's `warp` command) can move
//! time around. Timer-driven work runs on a [`PeriodicTask`], a small tokio
//! task that ticks on a fixed interval until it is cancelled.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock. Adjustments to the system clock show up as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning shares the underlying instant, so a test can hold one handle and
/// hand another to the component under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard = instant;
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// The wall clock shifted by an adjustable offset. Keeps running in real
/// time, which makes it handy for previewing the schedule on a future day.
#[derive(Debug, Clone)]
pub struct OffsetClock {
    offset: Arc<RwLock<ChronoDuration>>,
}

impl OffsetClock {
    pub fn new() -> Self {
        Self {
            offset: Arc::new(RwLock::new(ChronoDuration::zero())),
        }
    }

    pub fn shift(&self, by: ChronoDuration) {
        let mut guard = self.offset.write().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + by;
    }

    pub fn reset(&self) {
        *self.offset.write().unwrap_or_else(|e| e.into_inner()) = ChronoDuration::zero();
    }

    pub fn offset(&self) -> ChronoDuration {
        *self.offset.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for OffsetClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.offset()
    }
}

/// Shortest period a [`PeriodicTask`] will tick at.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A cancellable tokio task that runs a callback on a fixed interval.
///
/// The first tick fires immediately. Periods below [`MIN_PERIOD`] are raised
/// to it. Dropping the handle cancels the task, so a component that owns a
/// `PeriodicTask` can't leave a timer behind.
pub struct PeriodicTask {
    shutdown_tx: broadcast::Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawns the task's loop on the current tokio runtime.
    pub fn spawn<F>(name: &'static str, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick_count: u64 = 0;
            debug!("[{}] periodic task started ({:?}).", name, period);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        tick_count += 1;
                        trace!("[{}] tick #{}", name, tick_count);
                        on_tick(tick_count);
                    }
                }
            }
            debug!("[{}] periodic task shutting down.", name);
        });
        Self {
            shutdown_tx,
            join: Some(join),
        }
    }

    /// Returns `true` while the underlying tokio task is still alive.
    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Stops the loop. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(join) = self.join.take() {
            self.shutdown_tx.send(()).ok();
            join.abort();
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();
        other.advance(ChronoDuration::minutes(5));
        assert_eq!(clock.now(), start + ChronoDuration::minutes(5));
        clock.set(start);
        assert_eq!(other.now(), start);
    }

    #[test]
    fn offset_clock_runs_ahead_of_the_wall_clock() {
        let clock = OffsetClock::new();
        clock.shift(ChronoDuration::days(2));
        clock.shift(ChronoDuration::hours(3));
        assert_eq!(clock.offset(), ChronoDuration::hours(51));
        assert!(clock.now() - Utc::now() > ChronoDuration::hours(50));
        clock.reset();
        assert_eq!(clock.offset(), ChronoDuration::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_ticks_until_cancelled() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        let mut task = PeriodicTask::spawn("test", Duration::from_secs(1), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // The first tick is immediate, then one per second.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert!(task.is_running());

        task.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_is_raised_to_the_minimum() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        let task = PeriodicTask::spawn("zero", Duration::ZERO, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_micros(5500)).await;
        assert!(task.is_running());
        assert_eq!(ticks.load(Ordering::SeqCst), 6);
    }
}
