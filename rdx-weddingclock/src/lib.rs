//! # Weddingclock
//!
//! The time-driven parts of a wedding information site, as a library.
//!
//! ## Core Concepts
//!
//! - **Catalog**: the static, multi-day list of events (ceremony, meals,
//!   parties), loaded once from configuration.
//! - **Schedule Resolver**: a pure function answering "what is on now, and
//!   what is next?" for any instant. It keeps no state; callers re-resolve
//!   on their own cadence.
//! - **Countdown**: a ticking readout of days/hours/minutes/seconds until a
//!   fixed target, recomputed from the clock on every tick.
//! - **Petal Shower**: a short, self-terminating burst of decorative falling
//!   petals with seedable randomness.
//! - **Engine**: owns the timers, publishes strongly-typed events over
//!   broadcast channels and cancels everything on shutdown.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use weddingclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load configuration (a TOML file plus WEDDINGCLOCK__* overrides).
//!     let config = WeddingClockConfig::load(Some("wedding.toml".as_ref()))?;
//!
//!     // 2. Create the engine.
//!     let engine = WeddingClockEngine::new(config)?;
//!
//!     // 3. Subscribe to an event stream before starting the engine.
//!     let mut schedule_events = engine.subscribe_schedule_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = schedule_events.recv().await {
//!             println!("Schedule changed: {:?}", event);
//!         }
//!     });
//!
//!     // 4. Run the engine. It will shut down on Ctrl+C.
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Wedding Clock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod catalog;
pub mod common;
pub mod components;
pub mod config;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod events;
pub mod schedule;
pub mod shower;
pub mod time;
pub mod viewport;

/// A prelude module for easy importing of the most common types.
pub mod prelude {
    pub use crate::catalog::{Catalog, Event, EventDetails, EventKind};
    pub use crate::common::{EventId, PetalId};
    pub use crate::config::WeddingClockConfig;
    pub use crate::countdown::{Countdown, CountdownPhase, CountdownState};
    pub use crate::engine::WeddingClockEngine;
    pub use crate::error::{CatalogError, ConfigError, WeddingClockError};
    pub use crate::events::{CountdownEvent, ScheduleEvent, ShowerEvent, SystemEvent};
    pub use crate::schedule::{resolve, Banner, ResolvedWindow};
    pub use crate::shower::{EmissionPlan, PetalShower};
    pub use crate::time::{Clock, ManualClock, OffsetClock, SystemClock};
    pub use crate::viewport::{Headless, SharedViewport, Viewport, ViewportSource};
}
