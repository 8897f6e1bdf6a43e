use std::time::Duration;

use horde_core::{Command, Event, WaveNumber, WavePolicy};
use horde_system_reachability::ReachableSet;
use horde_system_spawn_location::{Config as LocatorConfig, SpawnLocator};
use horde_system_spawn_scheduler::{Config as SchedulerConfig, SpawnScheduler};
use horde_system_wave_director::{Config as DirectorConfig, WaveDirector, WavePhase};
use horde_world::{self as world, query, World};

fn director() -> WaveDirector {
    WaveDirector::new(DirectorConfig::new(
        WavePolicy::new(6, 2, 10),
        5,
        Duration::from_secs(3),
        Duration::from_secs(5),
    ))
}

fn scheduler() -> SpawnScheduler {
    SpawnScheduler::new(
        SchedulerConfig::new(Duration::from_secs(2), 20, 0x4d59_5df4_d0f3_3173),
        SpawnLocator::new(LocatorConfig::new(1.0, 6, 100, 15.0, 0x7a31)),
    )
}

/// Routes an event batch through both systems, applies the commands they
/// emit, and repeats until the frame quiesces.
fn drive(
    world: &mut World,
    director: &mut WaveDirector,
    scheduler: &mut SpawnScheduler,
    seed_events: Vec<Event>,
    log: &mut Vec<Event>,
) {
    let mut events = seed_events;
    while !events.is_empty() {
        log.extend(events.iter().cloned());

        let mut follow_up = Vec::new();
        director.handle(&events, &mut follow_up);

        let mut commands = Vec::new();
        {
            let view = query::walkability_view(world);
            let mapping = query::grid_mapping(world);
            let player = query::player_position(world);
            let live = query::enemy_count(world);
            scheduler.handle(&events, view, &mapping, player, live, &mut commands);
        }

        for command in commands {
            world::apply(world, command, &mut follow_up);
        }
        events = follow_up;
    }
}

fn apply_and_drive(
    world: &mut World,
    director: &mut WaveDirector,
    scheduler: &mut SpawnScheduler,
    command: Command,
    log: &mut Vec<Event>,
) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    drive(world, director, scheduler, events, log);
}

/// Runs a session where the player instantly kills everything that appears,
/// stepping the clock in 500 ms increments for the given number of steps.
fn run_session(steps: u32) -> Vec<Event> {
    let mut world = World::new();
    let mut director = director();
    let mut scheduler = scheduler();
    let mut log = Vec::new();

    let mut seed = Vec::new();
    assert!(director.start_wave(WaveNumber::first(), &mut seed));
    drive(&mut world, &mut director, &mut scheduler, seed, &mut log);

    for _ in 0..steps {
        apply_and_drive(
            &mut world,
            &mut director,
            &mut scheduler,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut log,
        );

        let victims: Vec<_> = query::enemy_view(&world)
            .into_vec()
            .into_iter()
            .map(|snapshot| snapshot.id)
            .collect();
        for enemy_id in victims {
            apply_and_drive(
                &mut world,
                &mut director,
                &mut scheduler,
                Command::KillEnemy { enemy_id },
                &mut log,
            );
        }
    }

    log
}

fn count_started(log: &[Event], wave: WaveNumber) -> usize {
    log.iter()
        .filter(|event| matches!(event, Event::WaveStarted { wave: started, .. } if *started == wave))
        .count()
}

#[test]
fn a_full_wave_cycle_reaches_the_next_wave() {
    // Wave 1 quota is 6 at a 2 s cadence: fully spawned by 12 s, kills land
    // immediately, then 3 s announcement + 5 s cooldown. 25 s of simulated
    // time comfortably covers the transition into wave 2.
    let log = run_session(50);

    assert_eq!(count_started(&log, WaveNumber::first()), 1);
    assert_eq!(count_started(&log, WaveNumber::new(2)), 1);

    let completions = log
        .iter()
        .filter(|event| matches!(event, Event::WaveCompleted { .. }))
        .count();
    assert_eq!(completions, 1, "completion must fire exactly once");

    let announcements: Vec<_> = log
        .iter()
        .filter_map(|event| match event {
            Event::WaveAnnounced { wave } => Some(*wave),
            _ => None,
        })
        .collect();
    assert_eq!(announcements, vec![WaveNumber::new(2)]);

    let wave_one_spawns = log
        .iter()
        .filter(|event| {
            matches!(event, Event::EnemySpawned { wave, .. } if *wave == WaveNumber::first())
        })
        .count();
    assert_eq!(wave_one_spawns, 6, "wave 1 spawns exactly its quota");
}

#[test]
fn spawned_enemies_are_reachable_from_the_player() {
    let mut world = World::new();
    let mut director = director();
    let mut scheduler = scheduler();
    let mut log = Vec::new();

    let mut seed = Vec::new();
    assert!(director.start_wave(WaveNumber::first(), &mut seed));
    drive(&mut world, &mut director, &mut scheduler, seed, &mut log);

    for _ in 0..30 {
        apply_and_drive(
            &mut world,
            &mut director,
            &mut scheduler,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut log,
        );
    }

    let player_cell = query::player_cell(&world).expect("player on grid");
    let view = query::walkability_view(&world);
    let reachable = ReachableSet::compute(view, player_cell);
    for snapshot in query::enemy_view(&world).iter() {
        let cell = snapshot.cell.expect("spawn on grid");
        assert!(
            reachable.is_reachable(cell),
            "enemy at {cell:?} is cut off from the player"
        );
    }
}

#[test]
fn clearing_mid_wave_stops_all_spawning() {
    let mut world = World::new();
    let mut director = director();
    let mut scheduler = scheduler();
    let mut log = Vec::new();

    let mut seed = Vec::new();
    assert!(director.start_wave(WaveNumber::first(), &mut seed));
    drive(&mut world, &mut director, &mut scheduler, seed, &mut log);

    // Let three spawns happen, then pull the plug.
    for _ in 0..12 {
        apply_and_drive(
            &mut world,
            &mut director,
            &mut scheduler,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut log,
        );
    }
    assert_eq!(query::enemy_count(&world), 3);

    apply_and_drive(
        &mut world,
        &mut director,
        &mut scheduler,
        Command::ClearEnemies,
        &mut log,
    );
    assert_eq!(query::enemy_count(&world), 0);
    assert_eq!(director.phase(), WavePhase::Idle);
    assert!(!scheduler.is_armed());

    log.clear();
    for _ in 0..20 {
        apply_and_drive(
            &mut world,
            &mut director,
            &mut scheduler,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut log,
        );
    }
    assert!(
        !log.iter().any(|event| matches!(event, Event::EnemySpawned { .. })),
        "no enemy may appear after a clear"
    );
}

#[test]
fn identical_scripts_replay_identically() {
    let first = run_session(40);
    let second = run_session(40);
    assert_eq!(first, second, "replay diverged between runs");
}
