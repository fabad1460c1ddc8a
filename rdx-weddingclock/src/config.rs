//! Defines all configuration structures for the wedding clock.
//!
//! These structs are deserialized with `serde` from a TOML file layered with
//! `WEDDINGCLOCK__*` environment overrides, so the countdown target, the event
//! catalog and the shower's look can all change without touching code.

use crate::catalog::{Catalog, EventEntry, LoadReport};
use crate::error::{CatalogError, ConfigError};
use crate::shower::{EmissionPlan, Palette, PetalStyle};
use crate::viewport::Viewport;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// The top-level configuration for the `WeddingClockEngine`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeddingClockConfig {
    /// Timezone for naive catalog timestamps and local time labels.
    /// Uses IANA names (e.g. "Europe/Rome"). Defaults to UTC.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    #[serde(default)]
    pub countdown: CountdownConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub shower: ShowerConfig,

    /// The viewport petals fall through. Absent means headless, and the
    /// shower won't run.
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// The static event catalog.
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

/// Settings for the countdown.
#[derive(Debug, Clone, Deserialize)]
pub struct CountdownConfig {
    /// The instant being counted down to. No target, no countdown.
    #[serde(default)]
    pub target: Option<DateTime<Utc>>,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Settings for the Now/Next watcher.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// How often the engine re-resolves the schedule.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

/// Settings for the petal shower.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowerConfig {
    /// Whether the engine fires a shower when it starts.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub tiers: EmissionPlan,

    #[serde(default)]
    pub palette: Palette,

    #[serde(default)]
    pub style: PetalStyle,

    /// Fixed seed for reproducible showers.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WeddingClockConfig {
    /// Loads configuration from an optional TOML file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }
        let config: Self = builder
            .add_source(
                Environment::with_prefix("WEDDINGCLOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string, without environment overrides.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make a component misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countdown.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("countdown.tick_interval_ms", "must be positive"));
        }
        if self.schedule.refresh_interval_ms == 0 {
            return Err(ConfigError::invalid("schedule.refresh_interval_ms", "must be positive"));
        }
        if let Some(tier) = self.shower.tiers.tiers().iter().find(|t| t.interval.is_zero()) {
            return Err(ConfigError::invalid(
                "shower.tiers",
                format!("tier lasting {:?} has a zero interval", tier.duration),
            ));
        }
        let style = &self.shower.style;
        if !(0.0..=1.0).contains(&style.small_probability) {
            return Err(ConfigError::invalid("shower.style.small_probability", "must be within [0, 1]"));
        }
        if !style.sway_amplitude.is_ordered() {
            return Err(ConfigError::invalid("shower.style.sway_amplitude", "min exceeds max"));
        }
        if !style.fall_duration_ms.is_ordered() {
            return Err(ConfigError::invalid("shower.style.fall_duration_ms", "min exceeds max"));
        }
        if let Some(viewport) = &self.viewport {
            if !viewport.is_usable() {
                return Err(ConfigError::invalid("viewport", "width and height must be positive"));
            }
        }
        Ok(())
    }

    /// Builds the event catalog from the `[[events]]` entries.
    pub fn catalog(&self) -> Result<(Catalog, LoadReport), CatalogError> {
        Catalog::from_entries(&self.events, self.timezone)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.countdown.tick_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.schedule.refresh_interval_ms)
    }
}

// --- Default value functions for serde ---

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_refresh_interval_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for WeddingClockConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            countdown: CountdownConfig::default(),
            schedule: ScheduleConfig::default(),
            shower: ShowerConfig::default(),
            viewport: None,
            events: Vec::new(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            target: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl Default for ShowerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tiers: EmissionPlan::default(),
            palette: Palette::default(),
            style: PetalStyle::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r##"
timezone = "Europe/Rome"

[countdown]
target = "2026-06-20T14:00:00Z"
tick_interval_ms = 500

[viewport]
width = 1280.0
height = 720.0

[shower]
seed = 9

[[shower.tiers]]
interval_ms = 50
duration_ms = 1000

[[shower.palette]]
name = "white"
weight = 1
colors = ["#ffffff"]

[[events]]
id = "welcome"
title = "Welcome Drinks"
day = 1
since = "2026-06-19T19:00:00"
till = "2026-06-19T22:00:00"
location = "Terrace"

[[events]]
id = "ceremony"
title = "Ceremony"
day = 2
since = "2026-06-20T16:00:00"
till = "2026-06-20T17:00:00"
"##;

    #[test]
    fn parses_a_full_file() {
        let config = WeddingClockConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Rome);
        assert_eq!(
            config.countdown.target,
            Some(Utc.with_ymd_and_hms(2026, 6, 20, 14, 0, 0).unwrap())
        );
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.viewport, Some(Viewport::new(1280.0, 720.0)));
        assert_eq!(config.shower.seed, Some(9));
        assert_eq!(config.shower.tiers.total_spawns(), 20);
        assert_eq!(config.shower.palette.categories().len(), 1);
        assert_eq!(config.shower.style, PetalStyle::default());

        let (catalog, report) = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(report.excluded.is_empty());
        assert_eq!(
            catalog.get("ceremony").unwrap().since,
            Utc.with_ymd_and_hms(2026, 6, 20, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn example_file_loads() {
        let config = WeddingClockConfig::from_toml_str(include_str!("../wedding.example.toml")).unwrap();
        let (catalog, report) = config.catalog().unwrap();
        assert_eq!(catalog.len(), 8);
        assert!(report.excluded.is_empty());
        assert_eq!(catalog.days(), vec![1, 2, 3]);
        assert_eq!(config.shower.tiers, EmissionPlan::default());
        assert_eq!(config.shower.style, PetalStyle::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = WeddingClockConfig::from_toml_str("").unwrap();
        assert_eq!(config.timezone, Tz::UTC);
        assert!(config.countdown.target.is_none());
        assert!(config.viewport.is_none());
        assert!(config.shower.enabled);
        assert_eq!(config.shower.tiers, EmissionPlan::default());
        assert!(config.events.is_empty());
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let err = WeddingClockConfig::from_toml_str("[countdown]\ntick_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "countdown.tick_interval_ms", .. }));
    }

    #[test]
    fn inverted_fall_duration_is_rejected() {
        let source = "[shower.style.fall_duration_ms]\nmin = 5000\nmax = 1000\n";
        let err = WeddingClockConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "shower.style.fall_duration_ms", .. }));
    }

    #[test]
    fn zero_weight_palette_fails_to_load() {
        let source = "[[shower.palette]]\nname = \"red\"\nweight = 0\ncolors = [\"#f00\"]\n";
        assert!(matches!(
            WeddingClockConfig::from_toml_str(source),
            Err(ConfigError::Load(_))
        ));
    }
}
