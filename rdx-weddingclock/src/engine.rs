//! The engine that wires the catalog, countdown and shower together.

use crate::catalog::{Catalog, Event, EventDetails, LoadReport};
use crate::components::watcher::ScheduleWatcher;
use crate::config::WeddingClockConfig;
use crate::countdown::{Countdown, CountdownState};
use crate::error::WeddingClockError;
use crate::events::{CountdownEvent, ScheduleEvent, ShowerEvent, SystemEvent};
use crate::schedule::{Banner, ResolvedWindow};
use crate::shower::PetalShower;
use crate::time::{Clock, PeriodicTask, SystemClock};
use crate::viewport::SharedViewport;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// The main wedding clock engine.
///
/// This struct is the central point of control. It holds the configuration
/// and the catalog, owns the countdown, the shower and the schedule watcher,
/// and fans their output out over broadcast channels. It is cheap to clone;
/// every clone is a handle to the same running instance.
#[derive(Clone)]
pub struct WeddingClockEngine {
    config: Arc<WeddingClockConfig>,
    catalog: Arc<Catalog>,
    load_report: Arc<LoadReport>,
    clock: Arc<dyn Clock>,
    viewport: SharedViewport,
    system_event_sender: broadcast::Sender<SystemEvent>,
    schedule_event_sender: broadcast::Sender<ScheduleEvent>,
    countdown_event_sender: broadcast::Sender<CountdownEvent>,
    shower_event_sender: broadcast::Sender<ShowerEvent>,
    countdown: Arc<RwLock<Option<Countdown>>>,
    shower: Arc<RwLock<PetalShower>>,
    schedule_task: Arc<RwLock<Option<PeriodicTask>>>,
}

// Core implementation block for internal logic.
impl WeddingClockEngine {
    /// Creates an engine reading the system wall clock.
    pub fn new(config: WeddingClockConfig) -> Result<Self, WeddingClockError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an engine reading time from `clock`.
    pub fn with_clock(
        config: WeddingClockConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WeddingClockError> {
        config.validate()?;
        let (catalog, load_report) = config.catalog()?;
        if !load_report.excluded.is_empty() {
            warn!(
                "{} malformed event(s) excluded from the schedule.",
                load_report.excluded.len()
            );
        }

        let (system_event_sender, _) = broadcast::channel(64);
        let (schedule_event_sender, _) = broadcast::channel(64);
        let (countdown_event_sender, _) = broadcast::channel(64);
        let (shower_event_sender, _) = broadcast::channel(256);

        let countdown = config.countdown.target.map(|target| {
            Countdown::with_event_sender(
                target,
                config.tick_interval(),
                clock.clone(),
                countdown_event_sender.clone(),
            )
        });

        let viewport = SharedViewport::new(config.viewport);
        let shower_config = &config.shower;
        let rng = match shower_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let shower = PetalShower::with_rng(
            shower_config.tiers.clone(),
            shower_config.palette.clone(),
            shower_config.style.clone(),
            Arc::new(viewport.clone()),
            rng,
        )
        .with_event_sender(shower_event_sender.clone());

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            load_report: Arc::new(load_report),
            clock,
            viewport,
            system_event_sender,
            schedule_event_sender,
            countdown_event_sender,
            shower_event_sender,
            countdown: Arc::new(RwLock::new(countdown)),
            shower: Arc::new(RwLock::new(shower)),
            schedule_task: Arc::new(RwLock::new(None)),
        })
    }

    /// Runs the engine until Ctrl+C is received.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.start().await;
        info!("Engine running. Press Ctrl+C to shut down.");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received.");
        self.shutdown().await;
        Ok(())
    }

    /// Runs the engine until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.start().await;
        shutdown.await;
        self.shutdown().await;
    }

    /// Starts the countdown, the schedule watcher and (if enabled) a shower.
    pub async fn start(&self) {
        info!("WeddingClockEngine starting up...");
        if let Some(countdown) = self.countdown.write().await.as_mut() {
            countdown.start();
        }

        let mut watcher = ScheduleWatcher::new(self.catalog.clone(), self.clock.clone());
        let sender = self.schedule_event_sender.clone();
        let task = PeriodicTask::spawn("schedule", self.config.refresh_interval(), move |_| {
            watcher.process_tick(&sender);
        });
        if let Some(mut previous) = self.schedule_task.write().await.replace(task) {
            previous.cancel();
        }

        if self.config.shower.enabled {
            self.trigger_shower().await;
        }

        self.system_event_sender
            .send(SystemEvent::EngineStarted {
                timestamp: tokio::time::Instant::now(),
            })
            .ok();
    }

    /// Cancels every timer the engine owns. Petals already falling are left
    /// to land on their own.
    pub async fn shutdown(&self) {
        if let Some(countdown) = self.countdown.write().await.as_mut() {
            countdown.stop();
        }
        if let Some(mut task) = self.schedule_task.write().await.take() {
            task.cancel();
        }
        self.shower.write().await.stop();
        self.system_event_sender
            .send(SystemEvent::EngineShutdown)
            .ok();
        info!("WeddingClockEngine has shut down.");
    }
}

// Public API implementation block.
impl WeddingClockEngine {
    pub fn config(&self) -> &WeddingClockConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Events that were dropped from the catalog at load time.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// The viewport handle, for reporting resizes.
    pub fn viewport(&self) -> &SharedViewport {
        &self.viewport
    }

    /// Resolves the current and next event at the clock's current time.
    pub fn resolve_now(&self) -> ResolvedWindow<'_> {
        self.catalog.resolve(self.clock.now())
    }

    pub fn banner_now(&self) -> Banner {
        let now = self.clock.now();
        self.catalog.resolve(now).banner(now)
    }

    pub fn details_for(&self, event: &Event) -> EventDetails {
        event.details()
    }

    /// The event's time range in the configured timezone.
    pub fn time_label(&self, event: &Event) -> String {
        event.time_label(&self.config.timezone)
    }

    /// The latest countdown readout, or `None` if no target is configured.
    pub async fn countdown_readout(&self) -> Option<CountdownState> {
        self.countdown.read().await.as_ref().map(Countdown::readout)
    }

    /// Starts a petal shower. Returns `false` if one is already emitting or
    /// there is no viewport.
    pub async fn trigger_shower(&self) -> bool {
        self.shower.write().await.activate()
    }

    pub async fn live_petals(&self) -> usize {
        self.shower.read().await.live_count().await
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }

    /// Subscribes to the `ScheduleEvent` stream.
    pub fn subscribe_schedule_events(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.schedule_event_sender.subscribe()
    }

    /// Subscribes to the `CountdownEvent` stream.
    pub fn subscribe_countdown_events(&self) -> broadcast::Receiver<CountdownEvent> {
        self.countdown_event_sender.subscribe()
    }

    /// Subscribes to the `ShowerEvent` stream.
    pub fn subscribe_shower_events(&self) -> broadcast::Receiver<ShowerEvent> {
        self.shower_event_sender.subscribe()
    }
}
