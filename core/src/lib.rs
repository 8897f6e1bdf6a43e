#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond with new command batches; the wave director is
//! additionally allowed to emit lifecycle events of its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs the walkability grid produced by the level generator.
    ConfigureTerrain {
        /// Number of grid columns.
        columns: u32,
        /// Number of grid rows.
        rows: u32,
        /// Length of each square tile measured in world units.
        tile_length: f32,
        /// World-space position of the corner of cell `(0, 0)`.
        origin: WorldPosition,
        /// Row-major walkability flags, one per cell.
        walkable: Vec<bool>,
    },
    /// Updates the tracked player position.
    SetPlayerPosition {
        /// Current world-space position of the player.
        position: WorldPosition,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests creation of one enemy at the provided world position.
    SpawnEnemy {
        /// Wave the enemy belongs to.
        wave: WaveNumber,
        /// World-space position the enemy appears at.
        position: WorldPosition,
    },
    /// Reports that an enemy died and must leave the registry.
    KillEnemy {
        /// Identifier of the enemy that died.
        enemy_id: EnemyId,
    },
    /// Removes every live enemy and signals systems to cancel pending work.
    ClearEnemies,
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new walkability grid was installed.
    TerrainConfigured {
        /// Number of grid columns in the new terrain.
        columns: u32,
        /// Number of grid rows in the new terrain.
        rows: u32,
    },
    /// Reports that a terrain configuration request was rejected.
    TerrainRejected {
        /// Specific reason the configuration failed.
        reason: TerrainError,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy was created and registered.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy_id: EnemyId,
        /// Wave the enemy belongs to.
        wave: WaveNumber,
        /// Grid cell the spawn position maps to, when it lies on the grid.
        cell: Option<CellCoord>,
        /// World-space position the enemy appeared at.
        position: WorldPosition,
    },
    /// Confirms that an enemy was removed from the registry after dying.
    EnemyKilled {
        /// Identifier of the enemy that died.
        enemy_id: EnemyId,
        /// Wave the enemy belonged to.
        wave: WaveNumber,
    },
    /// Confirms that the enemy registry was emptied.
    EnemiesCleared,
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Wave that became active.
        wave: WaveNumber,
        /// Total number of enemies planned for the wave.
        quota: u32,
    },
    /// Announces the upcoming wave during the transition window.
    WaveAnnounced {
        /// Wave that is about to start.
        wave: WaveNumber,
    },
    /// Announces that every enemy of a wave was spawned and killed.
    WaveCompleted {
        /// Wave that finished.
        wave: WaveNumber,
    },
}

/// Reasons a terrain configuration request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum TerrainError {
    /// The walkability flag count does not match the grid dimensions.
    #[error("expected {expected} walkability flags, received {actual}")]
    CellCountMismatch {
        /// Cell count implied by the requested dimensions.
        expected: usize,
        /// Number of flags actually provided.
        actual: usize,
    },
    /// The tile length is zero, negative, or not finite.
    #[error("tile length must be finite and positive")]
    DegenerateTileLength,
}

/// Unique identifier assigned to an enemy by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based wave counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a wave number with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The first wave of a session.
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    /// Retrieves the numeric representation of the wave number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// The wave that follows this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Point in continuous world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPosition {
    x: f32,
    y: f32,
}

impl WorldPosition {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPosition) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Mapping between grid cells and world space.
///
/// The grid occupies the axis-aligned region starting at `origin`, with each
/// cell covering a `tile_length` × `tile_length` square. Cell `(0, 0)` has its
/// corner at `origin` and the grid grows toward positive `x` (columns) and
/// positive `y` (rows).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapping {
    origin: WorldPosition,
    tile_length: f32,
}

impl GridMapping {
    /// Creates a new mapping from the provided origin and tile length.
    #[must_use]
    pub const fn new(origin: WorldPosition, tile_length: f32) -> Self {
        Self {
            origin,
            tile_length,
        }
    }

    /// World-space position of the corner of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> WorldPosition {
        self.origin
    }

    /// Length of each square tile measured in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// World-space center of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> WorldPosition {
        WorldPosition::new(
            self.origin.x() + (cell.column() as f32 + 0.5) * self.tile_length,
            self.origin.y() + (cell.row() as f32 + 0.5) * self.tile_length,
        )
    }

    /// Grid cell containing the provided world-space point.
    ///
    /// Returns `None` when the point lies before the grid origin on either
    /// axis, when the mapping is degenerate, or when the resulting index does
    /// not fit a `u32`. Callers remain responsible for checking the upper grid
    /// bounds against their walkability view.
    #[must_use]
    pub fn world_to_cell(&self, position: WorldPosition) -> Option<CellCoord> {
        if !self.tile_length.is_finite() || self.tile_length <= 0.0 {
            return None;
        }

        let column = (position.x() - self.origin.x()) / self.tile_length;
        let row = (position.y() - self.origin.y()) / self.tile_length;
        if !column.is_finite() || !row.is_finite() || column < 0.0 || row < 0.0 {
            return None;
        }

        let column = column.floor();
        let row = row.floor();
        if column >= u32::MAX as f32 || row >= u32::MAX as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }
}

/// Read-only view into a dense row-major walkability grid.
#[derive(Clone, Copy, Debug)]
pub struct WalkabilityView<'a> {
    cells: &'a [bool],
    columns: u32,
    rows: u32,
}

impl<'a> WalkabilityView<'a> {
    /// Captures a new walkability view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [bool], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Reports whether the cell may be stood on. Out-of-bounds cells are not
    /// walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map_or(false, |index| self.cells.get(index).copied().unwrap_or(false))
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns an iterator over all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + 'a {
        self.cells.iter().copied()
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// World-space point proposed as a legal location for a new enemy, paired
/// with the grid cell it was derived from.
///
/// Candidates are transient: recomputed at each wave start and discarded when
/// the wave's spawn snapshot is released.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnCandidate {
    /// Grid cell the candidate was derived from.
    pub cell: CellCoord,
    /// World-space position handed to enemy creation.
    pub position: WorldPosition,
}

/// Sizing policy that derives each wave's enemy quota.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WavePolicy {
    base_quota: u32,
    quota_increment: u32,
    quota_increment_cap: u32,
}

impl WavePolicy {
    /// Creates a policy from a base quota, a per-wave increment, and the cap
    /// applied to the accumulated increment.
    #[must_use]
    pub const fn new(base_quota: u32, quota_increment: u32, quota_increment_cap: u32) -> Self {
        Self {
            base_quota,
            quota_increment,
            quota_increment_cap,
        }
    }

    /// Quota planned for wave one before any increment applies.
    #[must_use]
    pub const fn base_quota(&self) -> u32 {
        self.base_quota
    }

    /// Enemies added per wave past the first.
    #[must_use]
    pub const fn quota_increment(&self) -> u32 {
        self.quota_increment
    }

    /// Upper bound on the accumulated increment. Keeps late-wave quotas from
    /// growing unbounded.
    #[must_use]
    pub const fn quota_increment_cap(&self) -> u32 {
        self.quota_increment_cap
    }

    /// Total enemies planned for the provided wave.
    #[must_use]
    pub fn quota_for(&self, wave: WaveNumber) -> u32 {
        let steps = wave.get().saturating_sub(1);
        let extra = steps
            .saturating_mul(self.quota_increment)
            .min(self.quota_increment_cap);
        self.base_quota.saturating_add(extra)
    }
}
