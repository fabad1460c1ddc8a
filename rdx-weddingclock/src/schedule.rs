//! Resolves which event is happening now and which comes next.

use crate::catalog::{Catalog, Event};
use chrono::{DateTime, Duration, Utc};

/// The current and next event for one instant.
///
/// Nothing here is cached: the answer goes stale as time passes and callers
/// are expected to resolve again on their own cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedWindow<'a> {
    pub current: Option<&'a Event>,
    pub next: Option<&'a Event>,
}

/// Finds the current and next event in `events` at `now`.
///
/// Events are ordered by `since` with a stable sort, then scanned once. The
/// first event whose inclusive `[since, till]` contains `now` is current and
/// its sorted successor is next. Failing that, the first event starting after
/// `now` is next. The scan stops at the first hit, so on a shared boundary
/// between back-to-back events the earlier one wins.
pub fn resolve(events: &[Event], now: DateTime<Utc>) -> ResolvedWindow<'_> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by_key(|event| event.since);

    for (index, event) in sorted.iter().copied().enumerate() {
        if event.contains(now) {
            return ResolvedWindow {
                current: Some(event),
                next: sorted.get(index + 1).copied(),
            };
        }
        if event.since > now {
            return ResolvedWindow {
                current: None,
                next: Some(event),
            };
        }
    }
    ResolvedWindow::default()
}

impl Catalog {
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedWindow<'_> {
        resolve(self.events(), now)
    }
}

/// The sticky "Now / Next" banner shown over the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Banner {
    /// Title of the current event and how long it still runs.
    pub now: Option<(String, Duration)>,
    /// Title of the next event and how long until it starts.
    pub next: Option<(String, Duration)>,
}

impl<'a> ResolvedWindow<'a> {
    /// Ids of the current and next event, for cheap change detection.
    pub fn key(&self) -> (Option<&'a str>, Option<&'a str>) {
        (
            self.current.map(|event| event.id.as_str()),
            self.next.map(|event| event.id.as_str()),
        )
    }

    pub fn banner(&self, now: DateTime<Utc>) -> Banner {
        Banner {
            now: self
                .current
                .map(|event| (event.title.clone(), (event.till - now).max(Duration::zero()))),
            next: self
                .next
                .map(|event| (event.title.clone(), (event.since - now).max(Duration::zero()))),
        }
    }
}
