#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Horde Siege.

use horde_core::{
    CellCoord, Command, EnemyId, Event, GridMapping, TerrainError, WaveNumber, WorldPosition,
};

const DEFAULT_COLUMNS: u32 = 16;
const DEFAULT_ROWS: u32 = 16;
const DEFAULT_TILE_LENGTH: f32 = 1.0;

/// Represents the authoritative Horde Siege world state.
#[derive(Debug)]
pub struct World {
    terrain: Terrain,
    player: WorldPosition,
    enemies: Vec<Enemy>,
    next_enemy_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates a new world with an open default terrain ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        let terrain = Terrain::open(DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_TILE_LENGTH);
        let player = terrain
            .mapping
            .cell_center(CellCoord::new(DEFAULT_COLUMNS / 2, DEFAULT_ROWS / 2));
        Self {
            terrain,
            player,
            enemies: Vec::new(),
            next_enemy_id: 0,
            tick_index: 0,
        }
    }

    fn enemy_index(&self, enemy_id: EnemyId) -> Option<usize> {
        self.enemies.iter().position(|enemy| enemy.id == enemy_id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Terrain {
    columns: u32,
    rows: u32,
    mapping: GridMapping,
    walkable: Vec<bool>,
}

impl Terrain {
    fn open(columns: u32, rows: u32, tile_length: f32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            mapping: GridMapping::new(WorldPosition::new(0.0, 0.0), tile_length),
            walkable: vec![true; capacity],
        }
    }

    fn cell_for(&self, position: WorldPosition) -> Option<CellCoord> {
        self.mapping
            .world_to_cell(position)
            .filter(|cell| cell.column() < self.columns && cell.row() < self.rows)
    }
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    id: EnemyId,
    wave: WaveNumber,
    cell: Option<CellCoord>,
    position: WorldPosition,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureTerrain {
            columns,
            rows,
            tile_length,
            origin,
            walkable,
        } => {
            if !tile_length.is_finite() || tile_length <= 0.0 {
                out_events.push(Event::TerrainRejected {
                    reason: TerrainError::DegenerateTileLength,
                });
                return;
            }

            let expected_u64 = u64::from(columns) * u64::from(rows);
            let expected = usize::try_from(expected_u64).unwrap_or(usize::MAX);
            if walkable.len() != expected {
                out_events.push(Event::TerrainRejected {
                    reason: TerrainError::CellCountMismatch {
                        expected,
                        actual: walkable.len(),
                    },
                });
                return;
            }

            let had_enemies = !world.enemies.is_empty();
            world.terrain = Terrain {
                columns,
                rows,
                mapping: GridMapping::new(origin, tile_length),
                walkable,
            };
            world.enemies.clear();
            world.next_enemy_id = 0;

            out_events.push(Event::TerrainConfigured { columns, rows });
            if had_enemies {
                out_events.push(Event::EnemiesCleared);
            }
        }
        Command::SetPlayerPosition { position } => {
            world.player = position;
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnEnemy { wave, position } => {
            let enemy_id = EnemyId::new(world.next_enemy_id);
            world.next_enemy_id = world.next_enemy_id.saturating_add(1);
            let cell = world.terrain.cell_for(position);
            world.enemies.push(Enemy {
                id: enemy_id,
                wave,
                cell,
                position,
            });
            out_events.push(Event::EnemySpawned {
                enemy_id,
                wave,
                cell,
                position,
            });
        }
        Command::KillEnemy { enemy_id } => {
            // Removal happens at most once per id: repeated kill reports for
            // the same enemy stay silent.
            if let Some(index) = world.enemy_index(enemy_id) {
                let enemy = world.enemies.remove(index);
                out_events.push(Event::EnemyKilled {
                    enemy_id: enemy.id,
                    wave: enemy.wave,
                });
            }
        }
        Command::ClearEnemies => {
            world.enemies.clear();
            // Always announced: the event doubles as the cancellation signal
            // for pending spawn and transition work.
            out_events.push(Event::EnemiesCleared);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use horde_core::{CellCoord, EnemyId, GridMapping, WalkabilityView, WaveNumber, WorldPosition};

    /// Exposes a read-only view of the dense walkability grid.
    #[must_use]
    pub fn walkability_view(world: &World) -> WalkabilityView<'_> {
        WalkabilityView::new(
            &world.terrain.walkable,
            world.terrain.columns,
            world.terrain.rows,
        )
    }

    /// Grid-to-world mapping of the current terrain.
    #[must_use]
    pub fn grid_mapping(world: &World) -> GridMapping {
        world.terrain.mapping
    }

    /// Current world-space position of the player.
    #[must_use]
    pub fn player_position(world: &World) -> WorldPosition {
        world.player
    }

    /// Grid cell the player currently stands on, when it lies on the grid.
    #[must_use]
    pub fn player_cell(world: &World) -> Option<CellCoord> {
        world.terrain.cell_for(world.player)
    }

    /// Number of live enemies in the registry.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Number of ticks applied since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let mut snapshots: Vec<EnemySnapshot> = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                wave: enemy.wave,
                cell: enemy.cell,
                position: enemy.position,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        EnemyView { snapshots }
    }

    /// Read-only snapshot describing all live enemies.
    #[derive(Clone, Debug, Default)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured enemy snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Unique identifier assigned to the enemy.
        pub id: EnemyId,
        /// Wave the enemy belongs to.
        pub wave: WaveNumber,
        /// Grid cell the enemy spawned on, when it lies on the grid.
        pub cell: Option<CellCoord>,
        /// World-space position the enemy appeared at.
        pub position: WorldPosition,
    }
}
