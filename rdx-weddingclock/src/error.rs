//! Error types for the weddingclock library.
//!
//! The temporal components themselves never fail: resolution, countdown
//! ticks and petal spawning fall back to empty/zero/no-op results. Errors
//! only come out of loading the catalog and the configuration.

use crate::common::EventId;
use thiserror::Error;

/// Problems found while building an event catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("event at position {index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate event id '{id}'")]
    DuplicateId { id: EventId },

    #[error("event '{id}' has an unparseable {field} timestamp '{value}'")]
    InvalidTimestamp {
        id: EventId,
        field: &'static str,
        value: String,
    },
}

/// Problems found while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Umbrella error for everything the library can report.
#[derive(Debug, Error)]
pub enum WeddingClockError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
