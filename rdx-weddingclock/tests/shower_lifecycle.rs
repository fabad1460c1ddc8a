// End-to-end timing of the petal shower under tokio's paused clock.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use weddingclock::prelude::*;
use weddingclock::shower::{EmissionTier, Palette, PetalStyle};

fn shower_with(plan: EmissionPlan, seed: u64) -> PetalShower {
    PetalShower::with_rng(
        plan,
        Palette::default(),
        PetalStyle::default(),
        Arc::new(Viewport::new(1280.0, 720.0)),
        StdRng::seed_from_u64(seed),
    )
}

#[tokio::test(start_paused = true)]
async fn emission_count_matches_the_plan_and_stops_with_the_window() {
    let plan = EmissionPlan::default();
    let expected = 2_000 / 100 + 3_000 / 250;
    let mut shower = shower_with(plan.clone(), 1);
    let mut events = shower.subscribe();
    assert!(shower.activate());

    tokio::time::sleep(plan.window() + Duration::from_millis(1)).await;
    assert!(!shower.is_emitting());

    let mut spawned = 0;
    while let Ok(event) = events.try_recv() {
        if let ShowerEvent::PetalSpawned { .. } = event {
            spawned += 1;
        }
    }
    assert_eq!(spawned, expected);

    // Nothing more spawns after the window.
    tokio::time::sleep(Duration::from_secs(3)).await;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, ShowerEvent::PetalSpawned { .. }));
    }
    assert_eq!(shower.join_emission().await, expected);
}

#[tokio::test(start_paused = true)]
async fn live_set_drains_after_window_plus_longest_fall() {
    let plan = EmissionPlan::default();
    let longest_fall = Duration::from_millis(PetalStyle::default().fall_duration_ms.max);
    let mut shower = shower_with(plan.clone(), 2);
    let mut events = shower.subscribe();
    shower.activate();

    tokio::time::sleep(Duration::from_millis(2_050)).await;
    assert_eq!(shower.live_count().await, 20);

    tokio::time::sleep(plan.window() + longest_fall).await;
    assert_eq!(shower.live_count().await, 0);

    let mut spawned = 0;
    let mut landed = 0;
    let mut cleared = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            ShowerEvent::PetalSpawned { .. } => spawned += 1,
            ShowerEvent::PetalLanded { .. } => landed += 1,
            ShowerEvent::Cleared => cleared += 1,
            _ => {}
        }
    }
    assert_eq!(spawned, landed);
    assert_eq!(cleared, 1);
}

#[tokio::test(start_paused = true)]
async fn custom_single_tier_plan() {
    let plan = EmissionPlan::new(vec![EmissionTier::new(
        Duration::from_millis(400),
        Duration::from_millis(1_000),
    )]);
    let mut shower = shower_with(plan, 3);
    shower.activate();
    assert_eq!(shower.join_emission().await, 2);
}

#[tokio::test(start_paused = true)]
async fn same_seed_gives_the_same_shower() {
    let mut a = shower_with(EmissionPlan::default(), 99);
    let mut b = shower_with(EmissionPlan::default(), 99);
    a.activate();
    b.activate();
    tokio::time::sleep(Duration::from_millis(1_050)).await;

    let petals = |list: Vec<(PetalId, weddingclock::shower::LivePetal)>| {
        list.into_iter().map(|(_, live)| live.petal).collect::<Vec<_>>()
    };
    assert_eq!(petals(a.live_petals().await), petals(b.live_petals().await));
}
