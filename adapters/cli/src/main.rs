#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Horde Siege session.
//!
//! Generates a random terrain, drops the player in the middle, and pumps the
//! wave engine against a scripted combatant that kills one enemy on a fixed
//! cadence. Every lifecycle event is printed, making the binary both a demo
//! and a quick way to eyeball engine behavior under different tunables.

mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, ensure, Result};
use clap::Parser;
use horde_core::{CellCoord, Command, Event, WaveNumber, WorldPosition};
use horde_system_spawn_location::SpawnLocator;
use horde_system_spawn_scheduler::SpawnScheduler;
use horde_system_wave_director::WaveDirector;
use horde_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SimConfig;

/// Headless wave-survival simulation driver.
#[derive(Debug, Parser)]
#[command(name = "horde")]
struct Args {
    /// Number of terrain columns.
    #[arg(long, default_value_t = 24)]
    columns: u32,
    /// Number of terrain rows.
    #[arg(long, default_value_t = 24)]
    rows: u32,
    /// Probability that a generated tile is blocked.
    #[arg(long, default_value_t = 0.15)]
    obstacle_density: f64,
    /// Seed for terrain generation and spawn selection.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Number of completed waves to survive before exiting.
    #[arg(long, default_value_t = 3)]
    waves: u32,
    /// Simulated milliseconds advanced per step.
    #[arg(long, default_value_t = 250)]
    step_ms: u64,
    /// Simulated milliseconds between kills by the scripted combatant.
    #[arg(long, default_value_t = 1500)]
    kill_interval_ms: u64,
    /// Optional TOML file overriding the engine tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Upper bound on simulation steps before giving up.
    #[arg(long, default_value_t = 100_000)]
    max_steps: u64,
}

/// Entry point for the Horde Siege command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    let sim = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    run(&args, &sim)
}

fn run(args: &Args, sim: &SimConfig) -> Result<()> {
    ensure!(
        args.columns > 0 && args.rows > 0,
        "terrain needs at least one cell"
    );
    ensure!(
        (0.0..=1.0).contains(&args.obstacle_density),
        "obstacle density must lie in 0..=1"
    );

    let mut world = World::new();
    let mut director = WaveDirector::new(sim.director());
    let mut scheduler = SpawnScheduler::new(
        sim.scheduler(args.seed),
        SpawnLocator::new(sim.locator(args.seed)),
    );
    let mut completed = 0u32;

    let walkable = generate_terrain(args.columns, args.rows, args.obstacle_density, args.seed);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureTerrain {
            columns: args.columns,
            rows: args.rows,
            tile_length: 1.0,
            origin: WorldPosition::new(0.0, 0.0),
            walkable,
        },
        &mut events,
    );
    drive(
        &mut world,
        &mut director,
        &mut scheduler,
        events,
        &mut completed,
    );

    let mapping = query::grid_mapping(&world);
    let player_cell = CellCoord::new(args.columns / 2, args.rows / 2);
    world::apply(
        &mut world,
        Command::SetPlayerPosition {
            position: mapping.cell_center(player_cell),
        },
        &mut Vec::new(),
    );

    let mut seed_events = Vec::new();
    ensure!(
        director.start_wave(WaveNumber::first(), &mut seed_events),
        "wave one failed to start"
    );
    drive(
        &mut world,
        &mut director,
        &mut scheduler,
        seed_events,
        &mut completed,
    );

    let step = Duration::from_millis(args.step_ms.max(1));
    let kill_every = Duration::from_millis(args.kill_interval_ms.max(1));
    let mut kill_accumulator = Duration::ZERO;
    let mut steps = 0u64;

    while completed < args.waves {
        steps += 1;
        if steps > args.max_steps {
            bail!("no progress after {} simulated steps", args.max_steps);
        }

        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: step }, &mut events);
        drive(
            &mut world,
            &mut director,
            &mut scheduler,
            events,
            &mut completed,
        );

        kill_accumulator = kill_accumulator.saturating_add(step);
        while kill_accumulator >= kill_every {
            kill_accumulator -= kill_every;
            let victim = query::enemy_view(&world)
                .into_vec()
                .into_iter()
                .next()
                .map(|snapshot| snapshot.id);
            if let Some(enemy_id) = victim {
                let mut events = Vec::new();
                world::apply(&mut world, Command::KillEnemy { enemy_id }, &mut events);
                drive(
                    &mut world,
                    &mut director,
                    &mut scheduler,
                    events,
                    &mut completed,
                );
            }
        }
    }

    println!("survived {completed} waves");
    Ok(())
}

/// Routes an event batch through both systems, applies the commands they
/// emit, and repeats until the frame quiesces.
fn drive(
    world: &mut World,
    director: &mut WaveDirector,
    scheduler: &mut SpawnScheduler,
    seed_events: Vec<Event>,
    completed: &mut u32,
) {
    let mut events = seed_events;
    while !events.is_empty() {
        for event in &events {
            narrate(event, completed);
        }

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

fn narrate(event: &Event, completed: &mut u32) {
    match event {
        Event::TerrainConfigured { columns, rows } => {
            println!("terrain ready: {columns}x{rows}");
        }
        Event::TerrainRejected { reason } => println!("terrain rejected: {reason}"),
        Event::WaveAnnounced { wave } => println!("wave {} incoming", wave.get()),
        Event::WaveStarted { wave, quota } => {
            println!("wave {} started: {quota} enemies inbound", wave.get());
        }
        Event::WaveCompleted { wave } => {
            *completed += 1;
            println!("wave {} cleared", wave.get());
        }
        Event::EnemySpawned {
            enemy_id, position, ..
        } => {
            println!(
                "enemy {} spawned at ({:.1}, {:.1})",
                enemy_id.get(),
                position.x(),
                position.y()
            );
        }
        Event::EnemyKilled { enemy_id, .. } => println!("enemy {} down", enemy_id.get()),
        Event::EnemiesCleared => println!("field cleared"),
        Event::TimeAdvanced { .. } => {}
    }
}

/// Generates a random walkability grid, keeping a pocket around the player's
/// starting cell open so the session never begins inside an obstacle.
fn generate_terrain(columns: u32, rows: u32, obstacle_density: f64, seed: u64) -> Vec<bool> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cell_count = u64::from(columns) * u64::from(rows);
    let mut walkable: Vec<bool> = (0..cell_count)
        .map(|_| !rng.gen_bool(obstacle_density))
        .collect();

    let center_column = columns / 2;
    let center_row = rows / 2;
    for row in center_row.saturating_sub(1)..=(center_row + 1).min(rows - 1) {
        for column in center_column.saturating_sub(1)..=(center_column + 1).min(columns - 1) {
            let index = row as usize * columns as usize + column as usize;
            walkable[index] = true;
        }
    }

    walkable
}
