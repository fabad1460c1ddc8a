//! The static event catalog and the title-to-details lookup.
//!
//! The catalog is built once from configuration and then only read. Events
//! with an inverted or empty interval are dropped at load time (with a
//! warning) so the resolver never has to reason about them.

use crate::common::EventId;
use crate::error::CatalogError;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::slice;
use tracing::{debug, warn};

/// A single scheduled, time-bounded occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    /// Display label. Not unique: "Breakfast" shows up on several days.
    pub title: String,
    pub day: u32,
    pub since: DateTime<Utc>,
    pub till: DateTime<Utc>,
    pub location: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        title: impl Into<String>,
        day: u32,
        since: DateTime<Utc>,
        till: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            day,
            since,
            till,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.since <= now && now <= self.till
    }

    pub fn is_well_formed(&self) -> bool {
        self.since < self.till
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_title(&self.title)
    }

    pub fn details(&self) -> EventDetails {
        self.kind().details()
    }

    /// Formats the interval as local wall-clock times, e.g. `10:30 - 13:00`.
    pub fn time_label(&self, tz: &Tz) -> String {
        format!(
            "{} - {}",
            self.since.with_timezone(tz).format("%H:%M"),
            self.till.with_timezone(tz).format("%H:%M")
        )
    }
}

/// The kinds of event the site knows how to describe.
///
/// Titles map onto a kind by keyword; anything unrecognised is `Other`,
/// which still has a generic description and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WelcomeDrinks,
    Breakfast,
    Ceremony,
    CocktailHour,
    Reception,
    Party,
    Brunch,
    Activity,
    Departure,
    Other,
}

/// Human-readable description and icon key for an event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDetails {
    pub description: &'static str,
    pub icon: &'static str,
}

impl EventKind {
    pub fn from_title(title: &str) -> Self {
        let title = title.to_lowercase();
        let has = |needle: &str| title.contains(needle);
        if has("welcome") {
            Self::WelcomeDrinks
        } else if has("breakfast") {
            Self::Breakfast
        } else if has("brunch") {
            Self::Brunch
        } else if has("ceremony") {
            Self::Ceremony
        } else if has("cocktail") || has("aperitivo") {
            Self::CocktailHour
        } else if has("reception") || has("dinner") {
            Self::Reception
        } else if has("party") || has("dancing") {
            Self::Party
        } else if has("pool") || has("excursion") || has("activity") || has("tour") {
            Self::Activity
        } else if has("departure") || has("check-out") || has("checkout") {
            Self::Departure
        } else {
            Self::Other
        }
    }

    pub fn details(self) -> EventDetails {
        let (description, icon) = match self {
            Self::WelcomeDrinks => ("Drinks and snacks to welcome everyone as they arrive.", "glass"),
            Self::Breakfast => ("Breakfast is served at the venue restaurant.", "coffee"),
            Self::Ceremony => ("The ceremony itself. Please be seated ten minutes early.", "rings"),
            Self::CocktailHour => ("Cocktails and canapés on the terrace after the ceremony.", "cocktail"),
            Self::Reception => ("Dinner, toasts and speeches.", "dinner"),
            Self::Party => ("Music and dancing until late.", "music"),
            Self::Brunch => ("A relaxed farewell brunch for anyone still around.", "brunch"),
            Self::Activity => ("Optional activity around the venue.", "sun"),
            Self::Departure => ("Check-out and safe travels home.", "car"),
            Self::Other => ("See the schedule for details.", "calendar"),
        };
        EventDetails { description, icon }
    }
}

/// One `[[events]]` entry as written in the config file.
///
/// Timestamps are either RFC 3339 with an offset or naive local times
/// (`2026-01-15T10:30:00`) interpreted in the configured timezone.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEntry {
    pub id: String,
    pub title: String,
    pub day: u32,
    pub since: String,
    pub till: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// What happened while building a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ids of events dropped because `since >= till`.
    pub excluded: Vec<EventId>,
}

/// The complete, immutable collection of events in authoring order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    events: Vec<Event>,
}

impl Catalog {
    /// Builds a catalog, rejecting empty or duplicate ids and excluding
    /// malformed intervals.
    pub fn from_events(events: Vec<Event>) -> Result<(Self, LoadReport), CatalogError> {
        let mut seen = HashSet::new();
        let mut report = LoadReport::default();
        let mut kept = Vec::with_capacity(events.len());

        for (index, event) in events.into_iter().enumerate() {
            if event.id.as_str().trim().is_empty() {
                return Err(CatalogError::EmptyId { index });
            }
            if !seen.insert(event.id.clone()) {
                return Err(CatalogError::DuplicateId { id: event.id });
            }
            if !event.is_well_formed() {
                warn!(
                    "Excluding event '{}' ({}): since {} is not before till {}.",
                    event.id, event.title, event.since, event.till
                );
                report.excluded.push(event.id);
                continue;
            }
            kept.push(event);
        }

        debug!(
            "Catalog built with {} events ({} excluded).",
            kept.len(),
            report.excluded.len()
        );
        Ok((Self { events: kept }, report))
    }

    /// Parses config entries, interpreting naive timestamps in `tz`.
    pub fn from_entries(entries: &[EventEntry], tz: Tz) -> Result<(Self, LoadReport), CatalogError> {
        let events = entries
            .iter()
            .map(|entry| {
                let id = EventId::from(entry.id.as_str());
                let since = parse_instant(&entry.since, tz).ok_or_else(|| {
                    CatalogError::InvalidTimestamp {
                        id: id.clone(),
                        field: "since",
                        value: entry.since.clone(),
                    }
                })?;
                let till = parse_instant(&entry.till, tz).ok_or_else(|| {
                    CatalogError::InvalidTimestamp {
                        id: id.clone(),
                        field: "till",
                        value: entry.till.clone(),
                    }
                })?;
                Ok(Event {
                    id,
                    title: entry.title.clone(),
                    day: entry.day,
                    since,
                    till,
                    location: entry.location.clone(),
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        Self::from_events(events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id.as_str() == id)
    }

    /// Distinct day keys in ascending order.
    pub fn days(&self) -> Vec<u32> {
        self.events
            .iter()
            .map(|event| event.day)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Events of one day, earliest first.
    pub fn by_day(&self, day: u32) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().filter(|e| e.day == day).collect();
        events.sort_by_key(|event| event.since);
        events
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Event;
    type IntoIter = slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Parses an RFC 3339 instant, or a naive local timestamp in `tz`.
///
/// Ambiguous local times (DST fall-back) take the earlier instant; times
/// that don't exist (DST spring-forward) are rejected.
pub fn parse_instant(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Some(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap()
    }

    #[test]
    fn malformed_intervals_are_excluded_not_fatal() {
        let events = vec![
            Event::new("a", "Ceremony", 1, at(10, 0), at(11, 0)),
            Event::new("b", "Broken", 1, at(12, 0), at(12, 0)),
            Event::new("c", "Inverted", 1, at(14, 0), at(13, 0)),
        ];
        let (catalog, report) = Catalog::from_events(events).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(report.excluded, vec![EventId::from("b"), EventId::from("c")]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let events = vec![
            Event::new("a", "Breakfast", 1, at(8, 0), at(9, 0)),
            Event::new("a", "Breakfast", 2, at(8, 0) + Duration::days(1), at(9, 0) + Duration::days(1)),
        ];
        let err = Catalog::from_events(events).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId { id: EventId::from("a") });
    }

    #[test]
    fn empty_id_is_rejected() {
        let events = vec![Event::new(" ", "Breakfast", 1, at(8, 0), at(9, 0))];
        assert_eq!(
            Catalog::from_events(events).unwrap_err(),
            CatalogError::EmptyId { index: 0 }
        );
    }

    #[test]
    fn entries_use_configured_timezone_for_naive_timestamps() {
        let entries = vec![EventEntry {
            id: "ceremony".into(),
            title: "Ceremony".into(),
            day: 2,
            since: "2026-06-20T16:00:00".into(),
            till: "2026-06-20T17:00:00+02:00".into(),
            location: Some("Chapel".into()),
        }];
        let (catalog, _) = Catalog::from_entries(&entries, chrono_tz::Europe::Rome).unwrap();
        let event = catalog.get("ceremony").unwrap();
        assert_eq!(event.since, Utc.with_ymd_and_hms(2026, 6, 20, 14, 0, 0).unwrap());
        assert_eq!(event.till, Utc.with_ymd_and_hms(2026, 6, 20, 15, 0, 0).unwrap());
        assert_eq!(event.time_label(&chrono_tz::Europe::Rome), "16:00 - 17:00");
    }

    #[test]
    fn bad_timestamp_names_the_field() {
        let entries = vec![EventEntry {
            id: "x".into(),
            title: "Party".into(),
            day: 1,
            since: "2026-06-20T22:00:00".into(),
            till: "late".into(),
            location: None,
        }];
        match Catalog::from_entries(&entries, Tz::UTC) {
            Err(CatalogError::InvalidTimestamp { field, value, .. }) => {
                assert_eq!(field, "till");
                assert_eq!(value, "late");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn titles_map_to_kinds_with_fallback() {
        assert_eq!(EventKind::from_title("Breakfast"), EventKind::Breakfast);
        assert_eq!(EventKind::from_title("Welcome Drinks"), EventKind::WelcomeDrinks);
        assert_eq!(EventKind::from_title("Wedding Ceremony"), EventKind::Ceremony);
        assert_eq!(EventKind::from_title("Pool Day"), EventKind::Activity);
        assert_eq!(EventKind::from_title("Fireworks"), EventKind::Other);
        assert_eq!(EventKind::Other.details().icon, "calendar");
    }

    #[test]
    fn by_day_sorts_and_days_are_distinct() {
        let events = vec![
            Event::new("lunch", "Lunch", 1, at(13, 0), at(14, 0)),
            Event::new("breakfast", "Breakfast", 1, at(8, 0), at(9, 0)),
            Event::new("brunch", "Brunch", 3, at(11, 0) + Duration::days(2), at(12, 0) + Duration::days(2)),
        ];
        let (catalog, _) = Catalog::from_events(events).unwrap();
        assert_eq!(catalog.days(), vec![1, 3]);
        let ids: Vec<_> = catalog.by_day(1).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["breakfast", "lunch"]);
    }
}
