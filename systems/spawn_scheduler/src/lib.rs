#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cadenced, capped enemy creation for the active wave.
//!
//! While a wave is spawning, the scheduler converts elapsed simulated time
//! into spawn commands at a fixed interval, drawing uniformly from the wave's
//! validated candidate snapshot and honoring the live population cap. It
//! disarms itself the moment its quota is exhausted and whenever the world
//! signals a reset, so no stale cadence can ever spawn into a cleared wave.

use std::time::Duration;

use horde_core::{
    CellCoord, Command, Event, GridMapping, SpawnCandidate, WalkabilityView, WaveNumber,
    WorldPosition,
};
use horde_system_reachability::{filter_candidates, ReachableSet};
use horde_system_spawn_location::SpawnLocator;

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    max_concurrent_enemies: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided cadence, live-enemy
    /// cap, and candidate-selection seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, max_concurrent_enemies: u32, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            max_concurrent_enemies,
            rng_seed,
        }
    }

    /// Interval between spawn attempts.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }

    /// Maximum number of enemies allowed alive at once.
    #[must_use]
    pub const fn max_concurrent_enemies(&self) -> u32 {
        self.max_concurrent_enemies
    }

    /// Seed for the candidate-selection random stream.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

#[derive(Debug)]
struct ActiveWave {
    wave: WaveNumber,
    remaining: u32,
    candidates: Vec<SpawnCandidate>,
}

/// Time-driven system that emits spawn commands for the armed wave.
#[derive(Debug)]
pub struct SpawnScheduler {
    config: Config,
    locator: SpawnLocator,
    accumulator: Duration,
    rng_state: u64,
    active: Option<ActiveWave>,
}

impl SpawnScheduler {
    /// Creates a new scheduler using the supplied configuration and locator.
    #[must_use]
    pub const fn new(config: Config, locator: SpawnLocator) -> Self {
        Self {
            config,
            locator,
            accumulator: Duration::ZERO,
            rng_state: config.rng_seed,
            active: None,
        }
    }

    /// Reports whether a wave is currently armed for spawning.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    /// Enemies still owed to the armed wave.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.active.as_ref().map_or(0, |active| active.remaining)
    }

    /// Consumes events and immutable views to emit spawn commands.
    ///
    /// `live_enemies` is the world's current registry count; spawns emitted
    /// within this call count against the cap as well, so one oversized tick
    /// can never overshoot the population limit.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        player: WorldPosition,
        live_enemies: usize,
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::WaveStarted { wave, quota } => {
                    self.arm(*wave, *quota, view, mapping, player);
                }
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::EnemiesCleared
                | Event::TerrainConfigured { .. }
                | Event::WaveCompleted { .. } => self.disarm(),
                _ => {}
            }
        }

        let Some(mut active) = self.active.take() else {
            self.accumulator = Duration::ZERO;
            return;
        };

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let attempts = self.resolve_spawn_attempts();

        let cap = usize::try_from(self.config.max_concurrent_enemies).unwrap_or(usize::MAX);
        let mut live = live_enemies;
        let mut refreshed = false;

        for _ in 0..attempts {
            if active.remaining == 0 {
                break;
            }

            // Population cap reached: the tick is consumed, not banked, so a
            // long plateau does not burst-spawn the backlog afterwards.
            if live >= cap {
                continue;
            }

            if active.candidates.is_empty() && !refreshed {
                active.candidates = self.validated_candidates(view, mapping, player, active.wave);
                refreshed = true;
            }

            let position = match self.select_candidate(&active.candidates) {
                Some(candidate) => candidate.position,
                None => fallback_position(mapping),
            };

            out.push(Command::SpawnEnemy {
                wave: active.wave,
                position,
            });
            active.remaining -= 1;
            live += 1;
        }

        if active.remaining > 0 {
            self.active = Some(active);
        } else {
            self.accumulator = Duration::ZERO;
        }
    }

    /// Computes the validated candidate snapshot for a wave: locate, then
    /// keep only points reachable from the player's current cell.
    fn validated_candidates(
        &self,
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        player: WorldPosition,
        wave: WaveNumber,
    ) -> Vec<SpawnCandidate> {
        let raw = self.locator.locate(view, mapping, player, wave);
        match mapping.world_to_cell(player) {
            Some(cell) => {
                let reachable = ReachableSet::compute(view, cell);
                filter_candidates(raw, &reachable)
            }
            None => raw,
        }
    }

    fn arm(
        &mut self,
        wave: WaveNumber,
        quota: u32,
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        player: WorldPosition,
    ) {
        if quota == 0 {
            self.disarm();
            return;
        }

        let candidates = self.validated_candidates(view, mapping, player, wave);
        self.active = Some(ActiveWave {
            wave,
            remaining: quota,
            candidates,
        });
        self.accumulator = Duration::ZERO;
    }

    fn disarm(&mut self) {
        self.active = None;
        self.accumulator = Duration::ZERO;
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.config.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.config.spawn_interval {
            self.accumulator -= self.config.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn select_candidate<'a>(
        &mut self,
        candidates: &'a [SpawnCandidate],
    ) -> Option<&'a SpawnCandidate> {
        if candidates.is_empty() {
            return None;
        }

        let value = self.advance_rng();
        let index = (value % candidates.len() as u64) as usize;
        candidates.get(index)
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

/// Synthesized spawn position used when no candidate survives validation.
fn fallback_position(mapping: &GridMapping) -> WorldPosition {
    mapping.cell_center(CellCoord::new(0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_system_spawn_location::Config as LocatorConfig;

    fn locator() -> SpawnLocator {
        SpawnLocator::new(LocatorConfig::new(1.0, 6, 100, 15.0, 0x5eed))
    }

    fn scheduler(interval_ms: u64, cap: u32) -> SpawnScheduler {
        SpawnScheduler::new(
            Config::new(Duration::from_millis(interval_ms), cap, 0x1234_5678),
            locator(),
        )
    }

    fn mapping() -> GridMapping {
        GridMapping::new(WorldPosition::new(0.0, 0.0), 1.0)
    }

    fn wave_started(quota: u32) -> Event {
        Event::WaveStarted {
            wave: WaveNumber::first(),
            quota,
        }
    }

    fn tick(dt: Duration) -> Event {
        Event::TimeAdvanced { dt }
    }

    #[test]
    fn emits_one_spawn_per_elapsed_interval() {
        let cells = vec![true; 64];
        let view = WalkabilityView::new(&cells, 8, 8);
        let mapping = mapping();
        let player = WorldPosition::new(4.0, 4.0);
        let mut scheduler = scheduler(500, 32);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(8)], view, &mapping, player, 0, &mut commands);
        assert!(commands.is_empty(), "arming must not spawn immediately");
        assert!(scheduler.is_armed());

        scheduler.handle(
            &[tick(Duration::from_secs(2))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );
        assert_eq!(commands.len(), 4, "expected one spawn per interval");
        assert_eq!(scheduler.remaining(), 4);

        for command in &commands {
            match command {
                Command::SpawnEnemy { wave, .. } => assert_eq!(*wave, WaveNumber::first()),
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
    }

    #[test]
    fn disarms_once_the_quota_is_exhausted() {
        let cells = vec![true; 64];
        let view = WalkabilityView::new(&cells, 8, 8);
        let mapping = mapping();
        let player = WorldPosition::new(4.0, 4.0);
        let mut scheduler = scheduler(500, 32);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(3)], view, &mapping, player, 0, &mut commands);
        scheduler.handle(
            &[tick(Duration::from_secs(10))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );

        assert_eq!(commands.len(), 3, "spawns stop at the quota");
        assert!(!scheduler.is_armed());

        commands.clear();
        scheduler.handle(
            &[tick(Duration::from_secs(10))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );
        assert!(commands.is_empty(), "a disarmed scheduler stays silent");
    }

    #[test]
    fn capped_ticks_are_skipped_not_banked() {
        let cells = vec![true; 64];
        let view = WalkabilityView::new(&cells, 8, 8);
        let mapping = mapping();
        let player = WorldPosition::new(4.0, 4.0);
        let mut scheduler = scheduler(500, 2);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(6)], view, &mapping, player, 0, &mut commands);

        // Registry already at the cap: three whole intervals elapse with no
        // spawn and no credit accrued.
        scheduler.handle(
            &[tick(Duration::from_millis(1_500))],
            view,
            &mapping,
            player,
            2,
            &mut commands,
        );
        assert!(commands.is_empty());
        assert_eq!(scheduler.remaining(), 6);

        // Once the population drops, only newly elapsed intervals spawn.
        scheduler.handle(
            &[tick(Duration::from_millis(500))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn one_oversized_tick_respects_the_cap() {
        let cells = vec![true; 64];
        let view = WalkabilityView::new(&cells, 8, 8);
        let mapping = mapping();
        let player = WorldPosition::new(4.0, 4.0);
        let mut scheduler = scheduler(500, 3);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(10)], view, &mapping, player, 0, &mut commands);
        scheduler.handle(
            &[tick(Duration::from_secs(5))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );

        assert_eq!(commands.len(), 3, "spawns within one call count toward the cap");
        assert_eq!(scheduler.remaining(), 7);
    }

    #[test]
    fn clearing_enemies_cancels_the_cadence() {
        let cells = vec![true; 64];
        let view = WalkabilityView::new(&cells, 8, 8);
        let mapping = mapping();
        let player = WorldPosition::new(4.0, 4.0);
        let mut scheduler = scheduler(500, 32);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(5)], view, &mapping, player, 0, &mut commands);
        scheduler.handle(&[Event::EnemiesCleared], view, &mapping, player, 0, &mut commands);
        assert!(!scheduler.is_armed());

        scheduler.handle(
            &[tick(Duration::from_secs(30))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );
        assert!(commands.is_empty(), "no spawn may follow a clear");
    }

    #[test]
    fn spawns_only_reachable_candidates() {
        // A wall along column 4 splits the grid; the player sits on the left.
        let mut cells = vec![true; 81];
        for row in 0..9u32 {
            cells[(row * 9 + 4) as usize] = false;
        }
        let view = WalkabilityView::new(&cells, 9, 9);
        let mapping = mapping();
        let player = WorldPosition::new(2.5, 4.5);
        let mut scheduler = scheduler(500, 32);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(12)], view, &mapping, player, 0, &mut commands);
        scheduler.handle(
            &[tick(Duration::from_secs(6))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );

        assert!(!commands.is_empty());
        for command in &commands {
            match command {
                Command::SpawnEnemy { position, .. } => {
                    assert!(
                        position.x() < 4.0,
                        "spawned across the wall at {position:?}"
                    );
                }
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
    }

    #[test]
    fn unreachable_candidates_fall_back_near_the_origin() {
        // The player is sealed in a center room; every border candidate is
        // unreachable, so the snapshot filters to nothing and spawning falls
        // back to the synthesized origin point.
        let mut cells = vec![true; 49];
        for row in 1..6u32 {
            for column in 1..6u32 {
                let on_ring = row == 1 || row == 5 || column == 1 || column == 5;
                if on_ring {
                    cells[(row * 7 + column) as usize] = false;
                }
            }
        }
        let view = WalkabilityView::new(&cells, 7, 7);
        let mapping = mapping();
        let player = WorldPosition::new(3.5, 3.5);
        let mut scheduler = scheduler(500, 32);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(2)], view, &mapping, player, 0, &mut commands);
        scheduler.handle(
            &[tick(Duration::from_millis(500))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );

        assert_eq!(
            commands,
            vec![Command::SpawnEnemy {
                wave: WaveNumber::first(),
                position: mapping.cell_center(CellCoord::new(0, 0)),
            }]
        );
    }

    #[test]
    fn a_new_wave_replaces_the_previous_snapshot() {
        let cells = vec![true; 64];
        let view = WalkabilityView::new(&cells, 8, 8);
        let mapping = mapping();
        let player = WorldPosition::new(4.0, 4.0);
        let mut scheduler = scheduler(500, 32);

        let mut commands = Vec::new();
        scheduler.handle(&[wave_started(9)], view, &mapping, player, 0, &mut commands);
        scheduler.handle(
            &[Event::WaveStarted {
                wave: WaveNumber::new(2),
                quota: 4,
            }],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );

        assert_eq!(scheduler.remaining(), 4);
        scheduler.handle(
            &[tick(Duration::from_secs(10))],
            view,
            &mapping,
            player,
            0,
            &mut commands,
        );
        for command in &commands {
            match command {
                Command::SpawnEnemy { wave, .. } => assert_eq!(*wave, WaveNumber::new(2)),
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
    }
}
