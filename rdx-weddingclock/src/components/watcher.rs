//! Defines watchers that re-read the clock and publish higher-level events.

use crate::catalog::Catalog;
use crate::common::EventId;
use crate::events::ScheduleEvent;
use crate::time::Clock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

type WindowKey = (Option<EventId>, Option<EventId>);

/// Re-resolves the Now/Next window and reports when it changes.
///
/// The resolver itself keeps no state; this watcher remembers only the ids of
/// the last window it published.
pub(crate) struct ScheduleWatcher {
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    last_window: Option<WindowKey>,
}

impl ScheduleWatcher {
    pub(crate) fn new(catalog: Arc<Catalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            clock,
            last_window: None,
        }
    }

    /// Resolves at the current time and publishes a `WindowChanged` if the
    /// current or next event differs from last time.
    /// Returns `true` if an event was published.
    pub(crate) fn process_tick(&mut self, sender: &broadcast::Sender<ScheduleEvent>) -> bool {
        let now = self.clock.now();
        let window = self.catalog.resolve(now);
        let key: WindowKey = (
            window.current.map(|event| event.id.clone()),
            window.next.map(|event| event.id.clone()),
        );
        if self.last_window.as_ref() == Some(&key) {
            return false;
        }

        info!(
            "Schedule window changed: now={:?}, next={:?}",
            window.current.map(|e| e.title.as_str()),
            window.next.map(|e| e.title.as_str())
        );
        sender
            .send(ScheduleEvent::WindowChanged {
                current: key.0.clone(),
                next: key.1.clone(),
                at: now,
            })
            .ok();
        self.last_window = Some(key);
        true
    }
}
