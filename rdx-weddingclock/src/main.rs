use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weddingclock::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load configuration from the optional path argument.
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = WeddingClockConfig::load(path.as_deref())?;

    // 3. Create the engine.
    let engine = WeddingClockEngine::new(config)?;
    info!(
        "Loaded {} events across {} day(s).",
        engine.catalog().len(),
        engine.catalog().days().len()
    );

    // 4. Spawn tasks to listen to the different event streams.
    spawn_event_listeners(&engine);

    // 5. Run the engine.
    engine.run().await?;

    Ok(())
}

/// Spawns several tasks, each subscribing to a different event stream from the engine.
fn spawn_event_listeners(engine: &WeddingClockEngine) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let handle = engine.clone();
    let mut schedule_rx = engine.subscribe_schedule_events();
    tokio::spawn(async move {
        while let Ok(ScheduleEvent::WindowChanged { current, next, .. }) = schedule_rx.recv().await {
            let title = |id: &Option<EventId>| {
                id.as_ref()
                    .and_then(|id| handle.catalog().get(id.as_str()))
                    .map(|event| event.title.clone())
                    .unwrap_or_else(|| "-".to_string())
            };
            info!("[SCHEDULE] => Now: {} | Next: {}", title(&current), title(&next));
        }
    });

    let mut countdown_rx = engine.subscribe_countdown_events();
    tokio::spawn(async move {
        while let Ok(event) = countdown_rx.recv().await {
            match event {
                CountdownEvent::Tick(state) if state.seconds == 0 => {
                    info!("[COUNTDOWN] => {}", state);
                }
                CountdownEvent::TargetReached { target } => {
                    info!("[COUNTDOWN] => Target {} reached!", target);
                }
                _ => {}
            }
        }
    });

    let mut shower_rx = engine.subscribe_shower_events();
    tokio::spawn(async move {
        while let Ok(event) = shower_rx.recv().await {
            match event {
                ShowerEvent::PetalSpawned { .. } | ShowerEvent::PetalLanded { .. } => {}
                other => info!("[SHOWER] => {:?}", other),
            }
        }
    });
}
