//! The decorative petal shower.
//!
//! Activation starts an emission task that spawns petals on the schedule laid
//! out by an [`EmissionPlan`]. Every spawned petal gets its own small landing
//! task that removes it from the live set when its fall is over. Stopping the
//! shower only ends emission: petals already in the air keep falling and
//! clean up after themselves.

pub mod petal;
pub mod plan;

pub use petal::{ColorCategory, Palette, Petal, PetalFactory, PetalFrame, PetalSize, PetalStyle, Span};
pub use plan::{EmissionPlan, EmissionTier};

use crate::common::PetalId;
use crate::events::ShowerEvent;
use crate::viewport::ViewportSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use slotmap::SlotMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// A petal in the air, with the moment it was spawned.
#[derive(Debug, Clone)]
pub struct LivePetal {
    pub petal: Petal,
    pub spawned_at: Instant,
}

impl LivePetal {
    pub fn frame(&self, now: Instant) -> PetalFrame {
        self.petal.frame_at(now.saturating_duration_since(self.spawned_at))
    }
}

#[derive(Default)]
struct ShowerState {
    petals: SlotMap<PetalId, LivePetal>,
}

/// Spawns and tracks falling petals.
pub struct PetalShower {
    plan: EmissionPlan,
    factory: Arc<Mutex<PetalFactory<StdRng>>>,
    viewport: Arc<dyn ViewportSource>,
    state: Arc<RwLock<ShowerState>>,
    // Raised by `activate`, lowered by the emitter under the state write lock.
    emitting: Arc<AtomicBool>,
    event_sender: broadcast::Sender<ShowerEvent>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    emission: Option<JoinHandle<usize>>,
}

impl PetalShower {
    /// Creates a shower drawing randomness from the OS.
    pub fn new(
        plan: EmissionPlan,
        palette: Palette,
        style: PetalStyle,
        viewport: Arc<dyn ViewportSource>,
    ) -> Self {
        Self::with_rng(plan, palette, style, viewport, StdRng::from_entropy())
    }

    /// Creates a shower with a given random source, for reproducible runs.
    pub fn with_rng(
        plan: EmissionPlan,
        palette: Palette,
        style: PetalStyle,
        viewport: Arc<dyn ViewportSource>,
        rng: StdRng,
    ) -> Self {
        let (event_sender, _) = broadcast::channel(256);
        Self {
            plan,
            factory: Arc::new(Mutex::new(PetalFactory::new(palette, style, rng))),
            viewport,
            state: Arc::new(RwLock::new(ShowerState::default())),
            emitting: Arc::new(AtomicBool::new(false)),
            event_sender,
            shutdown_tx: None,
            emission: None,
        }
    }

    /// Publishes onto an existing event channel instead of a private one.
    pub fn with_event_sender(mut self, event_sender: broadcast::Sender<ShowerEvent>) -> Self {
        self.event_sender = event_sender;
        self
    }

    pub fn plan(&self) -> &EmissionPlan {
        &self.plan
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShowerEvent> {
        self.event_sender.subscribe()
    }

    /// Starts an emission window.
    ///
    /// Returns `false` without doing anything if a window is already open or
    /// there is no usable viewport to fall through.
    pub fn activate(&mut self) -> bool {
        if self.emission.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Petal shower already active; ignoring activation.");
            return false;
        }
        if !self.viewport.viewport().is_some_and(|v| v.is_usable()) {
            debug!("No viewport available; petal shower is a no-op.");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let emitter = Emitter {
            offsets: self.plan.spawn_offsets(),
            factory: self.factory.clone(),
            viewport: self.viewport.clone(),
            state: self.state.clone(),
            emitting: self.emitting.clone(),
            event_sender: self.event_sender.clone(),
        };
        self.emitting.store(true, Ordering::SeqCst);
        info!(
            "Petal shower activated: {} petals over {:?}.",
            self.plan.total_spawns(),
            self.plan.window()
        );
        self.emission = Some(tokio::spawn(emitter.run(shutdown_rx)));
        self.shutdown_tx = Some(shutdown_tx);
        true
    }

    /// Ends emission early. Petals already falling are left alone.
    pub fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            shutdown_tx.send(()).ok();
        }
    }

    /// Waits for the current emission window to close and returns how many
    /// petals it spawned.
    pub async fn join_emission(&mut self) -> usize {
        match self.emission.take() {
            Some(task) => task.await.unwrap_or(0),
            None => 0,
        }
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting.load(Ordering::SeqCst)
    }

    pub async fn live_count(&self) -> usize {
        self.state.read().await.petals.len()
    }

    /// Where every live petal is right now.
    pub async fn frames(&self) -> Vec<(PetalId, PetalFrame)> {
        let now = Instant::now();
        self.state
            .read()
            .await
            .petals
            .iter()
            .map(|(id, live)| (id, live.frame(now)))
            .collect()
    }

    pub async fn live_petals(&self) -> Vec<(PetalId, LivePetal)> {
        self.state
            .read()
            .await
            .petals
            .iter()
            .map(|(id, live)| (id, live.clone()))
            .collect()
    }
}

impl Drop for PetalShower {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the emission task needs, moved into it on activation.
struct Emitter {
    offsets: Vec<Duration>,
    factory: Arc<Mutex<PetalFactory<StdRng>>>,
    viewport: Arc<dyn ViewportSource>,
    state: Arc<RwLock<ShowerState>>,
    emitting: Arc<AtomicBool>,
    event_sender: broadcast::Sender<ShowerEvent>,
}

impl Emitter {
    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> usize {
        let started = Instant::now();
        self.event_sender.send(ShowerEvent::Started).ok();

        let mut spawned = 0;
        for offset in &self.offsets {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    debug!("Petal emission cancelled after {} spawns.", spawned);
                    break;
                }
                _ = tokio::time::sleep_until(started + *offset) => {}
            }
            // The viewport can go away mid-window; skip spawns until it's back.
            let Some(viewport) = self.viewport.viewport().filter(|v| v.is_usable()) else {
                continue;
            };
            let petal = self.factory.lock().await.spawn(viewport);
            let fall = petal.fall_duration;
            let id = self.state.write().await.petals.insert(LivePetal {
                petal,
                spawned_at: Instant::now(),
            });
            spawned += 1;
            trace!("Petal {:?} spawned, falling for {:?}.", id, fall);
            self.event_sender.send(ShowerEvent::PetalSpawned { id }).ok();
            tokio::spawn(land(
                id,
                fall,
                self.state.clone(),
                self.emitting.clone(),
                self.event_sender.clone(),
            ));
        }

        let cleared = {
            let state = self.state.write().await;
            self.emitting.store(false, Ordering::SeqCst);
            state.petals.is_empty()
        };
        info!("Petal emission finished; {} petals spawned.", spawned);
        self.event_sender
            .send(ShowerEvent::EmissionFinished { spawned })
            .ok();
        if cleared {
            self.event_sender.send(ShowerEvent::Cleared).ok();
        }
        spawned
    }
}

/// Waits out one petal's fall, then removes it from the live set.
async fn land(
    id: PetalId,
    fall: Duration,
    state: Arc<RwLock<ShowerState>>,
    emitting: Arc<AtomicBool>,
    event_sender: broadcast::Sender<ShowerEvent>,
) {
    tokio::time::sleep(fall).await;
    let cleared = {
        let mut state = state.write().await;
        if state.petals.remove(id).is_none() {
            return;
        }
        !emitting.load(Ordering::SeqCst) && state.petals.is_empty()
    };
    trace!("Petal {:?} landed.", id);
    event_sender.send(ShowerEvent::PetalLanded { id }).ok();
    if cleared {
        debug!("Last petal landed; shower cleared.");
        event_sender.send(ShowerEvent::Cleared).ok();
    }
}
