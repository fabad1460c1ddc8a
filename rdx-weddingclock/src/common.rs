//! Contains common, primitive types shared across the crate.
//!
//! Petals are tracked in a `SlotMap` while they fall, so they get a proper
//! slotmap key. Catalog events carry string ids authored by hand in the
//! config file, wrapped in a newtype so they can't be confused with titles.

use serde::Deserialize;
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a live petal in a shower.
    ///
    /// Keys are never reused for a different petal, so a late completion
    /// callback can't remove a petal spawned after it.
    pub struct PetalId;
}

/// Identifies one event in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
