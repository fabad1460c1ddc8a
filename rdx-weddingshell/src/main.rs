use anyhow::Result;
use chrono::Duration as ChronoDuration;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weddingclock::prelude::*;
use weddingclock::{ENGINE_NAME, VERSION as LIB_VERSION};

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct MyHighlighter;

impl Highlighter for MyHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.magenta().bold();
            let colored_rest = rest.magenta();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.magenta().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", "  ~ * ~  W E D D I N G   C L O C K  ~ * ~".magenta().bold());
    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "----------------------------------------------------------------".dimmed());
    println!("{}", version_string);
    println!("{}", "----------------------------------------------------------------".dimmed());
}

/// Spawns listeners for the engine's event streams.
fn spawn_event_listeners(engine: &WeddingClockEngine, is_watching_countdown: Arc<AtomicBool>) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            println!("\n<-- [SYSTEM EVENT] {:?}\n>> ", event);
        }
    });

    let handle = engine.clone();
    let mut schedule_rx = engine.subscribe_schedule_events();
    tokio::spawn(async move {
        while let Ok(ScheduleEvent::WindowChanged { current, .. }) = schedule_rx.recv().await {
            let title = current
                .as_ref()
                .and_then(|id| handle.catalog().get(id.as_str()))
                .map(|event| event.title.clone())
                .unwrap_or_else(|| "nothing".to_string());
            println!("\n<-- [SCHEDULE] Now: {}\n>> ", title.green());
        }
    });

    // Countdown ticks are noisy, so they're gated behind `watch on`.
    let mut countdown_rx = engine.subscribe_countdown_events();
    tokio::spawn(async move {
        while let Ok(event) = countdown_rx.recv().await {
            match event {
                CountdownEvent::Tick(state) => {
                    if is_watching_countdown.load(Ordering::Relaxed) {
                        println!("<-- [COUNTDOWN] {}", state);
                    }
                }
                CountdownEvent::TargetReached { .. } => {
                    println!("\n<-- [COUNTDOWN] {}\n>> ", "It's time!".magenta().bold());
                }
            }
        }
    });

    let mut shower_rx = engine.subscribe_shower_events();
    tokio::spawn(async move {
        while let Ok(event) = shower_rx.recv().await {
            match event {
                ShowerEvent::EmissionFinished { spawned } => {
                    println!("\n<-- [SHOWER] {} petals released.\n>> ", spawned);
                }
                ShowerEvent::Cleared => println!("\n<-- [SHOWER] All petals have landed.\n>> "),
                _ => {}
            }
        }
    });
}

fn describe(engine: &WeddingClockEngine, label: &str, event: Option<&Event>) {
    match event {
        Some(event) => {
            let details = engine.details_for(event);
            println!(
                "  {:<5} {} [{}] {}",
                label.bold(),
                event.title.green().bold(),
                engine.time_label(event),
                event.location.as_deref().unwrap_or("").dimmed()
            );
            println!("        {}", details.description.dimmed());
        }
        None => println!("  {:<5} {}", label.bold(), "-".dimmed()),
    }
}

fn format_span(span: ChronoDuration) -> String {
    let minutes = span.num_minutes();
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let path = env::args().nth(1).map(PathBuf::from);
    let config = WeddingClockConfig::load(path.as_deref())?;
    let clock = OffsetClock::new();
    let engine = WeddingClockEngine::with_clock(config, Arc::new(clock.clone()))?;
    let engine_handle = engine.clone();

    let is_watching_countdown = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine_handle, is_watching_countdown.clone());

    info!("Spawning {} in the background...", ENGINE_NAME);
    tokio::spawn(async move {
        if let Err(e) = engine.run().await {
            eprintln!("\nEngine stopped with an error: {}", e);
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(MyHighlighter));

    println!("{} is running. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.magenta());

    loop {
        let prompt = format!("{}", ">> ".magenta().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();
                let Some(command) = args.first() else {
                    continue;
                };
                match *command {
                    "now" => {
                        let window = engine_handle.resolve_now();
                        describe(&engine_handle, "Now", window.current);
                        describe(&engine_handle, "Next", window.next);
                    }
                    "next" => {
                        let banner = engine_handle.banner_now();
                        match banner.next {
                            Some((title, starts_in)) => {
                                println!("--> {} starts in {}", title.green(), format_span(starts_in))
                            }
                            None => println!("--> Nothing else on the schedule."),
                        }
                    }
                    "schedule" => {
                        let catalog = engine_handle.catalog();
                        let days = match args.get(1).map(|d| d.parse::<u32>()) {
                            Some(Ok(day)) => vec![day],
                            Some(Err(_)) => {
                                println!("Usage: schedule [DAY]");
                                continue;
                            }
                            None => catalog.days(),
                        };
                        let window = engine_handle.resolve_now();
                        let current = window.current.map(|e| e.id.clone());
                        for day in days {
                            println!("{}", format!("Day {}", day).bold());
                            for event in catalog.by_day(day) {
                                let marker = if current.as_ref() == Some(&event.id) { "*" } else { " " };
                                println!(
                                    " {} {} {}",
                                    marker.magenta().bold(),
                                    engine_handle.time_label(event).dimmed(),
                                    event.title
                                );
                            }
                        }
                    }
                    "countdown" => match engine_handle.countdown_readout().await {
                        Some(state) => println!("--> {}", state.to_string().magenta().bold()),
                        None => println!("--> No countdown target configured."),
                    },
                    "shower" => {
                        if engine_handle.trigger_shower().await {
                            println!("--> Petals away!");
                        } else {
                            println!("--> Shower already running or no viewport configured.");
                        }
                    }
                    "petals" => {
                        println!("--> {} petals in the air.", engine_handle.live_petals().await);
                    }
                    "resize" => match (args.get(1), args.get(2)) {
                        (Some(w), Some(h)) => match (w.parse::<f32>(), h.parse::<f32>()) {
                            (Ok(width), Ok(height)) => {
                                engine_handle.viewport().resize(width, height);
                                println!("--> Viewport is now {}x{}.", width, height);
                            }
                            _ => println!("Error: width and height must be numbers."),
                        },
                        _ => println!("Usage: resize <WIDTH> <HEIGHT>"),
                    },
                    "warp" => match args.get(1).map(|m| m.parse::<i64>()) {
                        Some(Ok(minutes)) => {
                            clock.shift(ChronoDuration::minutes(minutes));
                            println!("--> Clock offset is now {}.", format_span(clock.offset()));
                        }
                        Some(Err(_)) => println!("Error: minutes must be a whole number."),
                        None => {
                            clock.reset();
                            println!("--> Clock back to real time.");
                        }
                    },
                    "watch" => match args.get(1) {
                        Some(&"on") => {
                            is_watching_countdown.store(true, Ordering::Relaxed);
                            println!("--> Printing countdown ticks.");
                        }
                        Some(&"off") => {
                            is_watching_countdown.store(false, Ordering::Relaxed);
                            println!("--> Stopped printing countdown ticks.");
                        }
                        _ => println!("Usage: watch on|off"),
                    },
                    "help" => {
                        println!("Available commands:");
                        println!("  now                   - Shows the current and next event.");
                        println!("  next                  - Shows how long until the next event.");
                        println!("  schedule [DAY]        - Lists the schedule, marking what's on now.");
                        println!("  countdown             - Shows the countdown readout.");
                        println!("  shower                - Releases a petal shower.");
                        println!("  petals                - Counts petals still falling.");
                        println!("  resize <W> <H>        - Sets the viewport size.");
                        println!("  warp [MINUTES]        - Shifts the clock; no argument resets it.");
                        println!("  watch on|off          - Toggles printing countdown ticks.");
                        println!("  exit                  - Quits the shell.");
                    }
                    "exit" => break,
                    _ => println!("Unknown command: '{}'. Type 'help'.", line),
                }
            }
            Err(_) => {
                println!("Exiting weddingshell...");
                break;
            }
        }
    }

    Ok(())
}
