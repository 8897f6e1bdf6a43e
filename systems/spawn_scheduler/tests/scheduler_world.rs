use std::time::Duration;

use horde_core::{Command, Event, WaveNumber, WorldPosition};
use horde_system_spawn_location::{Config as LocatorConfig, SpawnLocator};
use horde_system_spawn_scheduler::{Config, SpawnScheduler};
use horde_world::{self as world, query, World};

fn scheduler(cap: u32) -> SpawnScheduler {
    SpawnScheduler::new(
        Config::new(Duration::from_secs(2), cap, 0x1234_5678),
        SpawnLocator::new(LocatorConfig::new(1.0, 6, 100, 15.0, 0x5eed)),
    )
}

/// Feeds one event batch to the scheduler and applies its commands.
fn step(
    world: &mut World,
    scheduler: &mut SpawnScheduler,
    events: &[Event],
    out_events: &mut Vec<Event>,
) {
    let mut commands = Vec::new();
    {
        let view = query::walkability_view(world);
        let mapping = query::grid_mapping(world);
        let player = query::player_position(world);
        let live = query::enemy_count(world);
        scheduler.handle(events, view, &mapping, player, live, &mut commands);
    }
    for command in commands {
        world::apply(world, command, out_events);
    }
}

fn tick(world: &mut World, scheduler: &mut SpawnScheduler, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);
    let mut produced = Vec::new();
    step(world, scheduler, &events, &mut produced);
    produced
}

#[test]
fn a_wave_fills_the_registry_up_to_its_quota() {
    let mut world = World::new();
    let mut scheduler = scheduler(32);

    let mut produced = Vec::new();
    step(
        &mut world,
        &mut scheduler,
        &[Event::WaveStarted {
            wave: WaveNumber::first(),
            quota: 10,
        }],
        &mut produced,
    );
    assert!(produced.is_empty(), "arming must not spawn");

    // Ten intervals of two seconds each.
    for _ in 0..20 {
        let _ = tick(&mut world, &mut scheduler, Duration::from_secs(1));
    }

    assert_eq!(query::enemy_count(&world), 10);
    assert!(!scheduler.is_armed());

    let ids: Vec<u32> = query::enemy_view(&world)
        .into_vec()
        .into_iter()
        .map(|snapshot| snapshot.id.get())
        .collect();
    assert_eq!(ids, (0..10).collect::<Vec<u32>>());
}

#[test]
fn the_live_registry_gates_further_spawns() {
    let mut world = World::new();
    let mut scheduler = scheduler(4);

    let mut produced = Vec::new();
    step(
        &mut world,
        &mut scheduler,
        &[Event::WaveStarted {
            wave: WaveNumber::first(),
            quota: 10,
        }],
        &mut produced,
    );

    for _ in 0..10 {
        let _ = tick(&mut world, &mut scheduler, Duration::from_secs(2));
    }
    assert_eq!(query::enemy_count(&world), 4, "population cap holds");
    assert!(scheduler.is_armed(), "quota is not exhausted yet");

    // Killing two enemies frees two slots; the cadence refills them.
    let victims: Vec<_> = query::enemy_view(&world)
        .into_vec()
        .into_iter()
        .take(2)
        .map(|snapshot| snapshot.id)
        .collect();
    let mut events = Vec::new();
    for enemy_id in victims {
        world::apply(&mut world, Command::KillEnemy { enemy_id }, &mut events);
    }
    let mut produced = Vec::new();
    step(&mut world, &mut scheduler, &events, &mut produced);

    for _ in 0..2 {
        let _ = tick(&mut world, &mut scheduler, Duration::from_secs(2));
    }
    assert_eq!(query::enemy_count(&world), 4, "freed slots are refilled");
}

#[test]
fn every_spawn_lands_on_a_walkable_cell_of_an_open_grid() {
    let mut world = World::new();
    let mut scheduler = scheduler(32);

    let mut produced = Vec::new();
    step(
        &mut world,
        &mut scheduler,
        &[Event::WaveStarted {
            wave: WaveNumber::first(),
            quota: 6,
        }],
        &mut produced,
    );
    for _ in 0..12 {
        let _ = tick(&mut world, &mut scheduler, Duration::from_secs(1));
    }

    let view = query::walkability_view(&world);
    for snapshot in query::enemy_view(&world).iter() {
        let cell = snapshot.cell.expect("spawn position on the grid");
        assert!(view.is_walkable(cell));
        assert_ne!(
            snapshot.position,
            WorldPosition::new(0.0, 0.0),
            "spawns use cell centers, not raw origins"
        );
    }
}
