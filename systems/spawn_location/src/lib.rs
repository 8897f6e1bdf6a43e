#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn point location with tiered fallback.
//!
//! The locator proposes world-space spawn candidates from a walkability grid.
//! Four strategies run in strict order, each tried only when the previous one
//! produced nothing: a border scan with a safety margin, the same scan one
//! tile in from the border, random interior sampling, and finally a
//! synthesized hard fallback that can never be empty. Placement therefore
//! degrades instead of failing when a level offers no good border tiles.

use std::collections::HashSet;
use std::f32::consts::FRAC_1_SQRT_2;

use horde_core::{CellCoord, GridMapping, SpawnCandidate, WalkabilityView, WaveNumber, WorldPosition};
use sha2::{Digest, Sha256};

const RNG_STREAM_INTERIOR: &str = "spawn/interior";
const RNG_STREAM_LAST_RESORT: &str = "spawn/last-resort";

const LAST_RESORT_INSET: u32 = 2;

/// Configuration parameters required to construct the locator.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    safety_radius: f32,
    safety_min_clear: u32,
    interior_attempts: u32,
    min_player_distance: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `safety_radius` is the world-unit distance of the eight probe points
    /// checked around border candidates; `safety_min_clear` is how many of
    /// those eight must be unobstructed. `interior_attempts` bounds random
    /// sampling in the later tiers, and `min_player_distance` screens
    /// last-resort points so enemies never materialize on top of the player.
    #[must_use]
    pub const fn new(
        safety_radius: f32,
        safety_min_clear: u32,
        interior_attempts: u32,
        min_player_distance: f32,
        rng_seed: u64,
    ) -> Self {
        Self {
            safety_radius,
            safety_min_clear,
            interior_attempts,
            min_player_distance,
            rng_seed,
        }
    }

    /// World-unit radius of the eight safety probes.
    #[must_use]
    pub const fn safety_radius(&self) -> f32 {
        self.safety_radius
    }

    /// Minimum number of unobstructed probes required of border candidates.
    #[must_use]
    pub const fn safety_min_clear(&self) -> u32 {
        self.safety_min_clear
    }

    /// Maximum random samples drawn by the sampling tiers.
    #[must_use]
    pub const fn interior_attempts(&self) -> u32 {
        self.interior_attempts
    }

    /// Minimum world-unit distance from the player for last-resort points.
    #[must_use]
    pub const fn min_player_distance(&self) -> f32 {
        self.min_player_distance
    }

    /// Seed feeding the per-wave random streams.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

/// Pure locator that derives spawn candidates from grid and player state.
#[derive(Clone, Copy, Debug)]
pub struct SpawnLocator {
    config: Config,
}

impl SpawnLocator {
    /// Creates a new locator using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Produces an ordered, duplicate-free collection of spawn candidates.
    ///
    /// The result is a pure function of the inputs: the random tiers draw
    /// from streams derived from the configured seed and the wave number, so
    /// replaying a wave replays its candidates. The collection is never empty;
    /// the final tier synthesizes a point regardless of walkability.
    #[must_use]
    pub fn locate(
        &self,
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        player: WorldPosition,
        wave: WaveNumber,
    ) -> Vec<SpawnCandidate> {
        let candidates = self.scan_ring(view, mapping, 0);
        if !candidates.is_empty() {
            return candidates;
        }

        let candidates = self.scan_ring(view, mapping, 1);
        if !candidates.is_empty() {
            return candidates;
        }

        let base_seed = derive_base_seed(self.config.rng_seed, wave);
        let mut rng = SplitMix64::new(derive_labeled_seed(base_seed, RNG_STREAM_INTERIOR));
        let candidates = self.interior_sampling(view, mapping, &mut rng);
        if !candidates.is_empty() {
            return candidates;
        }

        let mut rng = SplitMix64::new(derive_labeled_seed(base_seed, RNG_STREAM_LAST_RESORT));
        self.last_resort(view.dimensions(), mapping, player, &mut rng)
    }

    /// Walks the grid ring at the provided inset, keeping walkable cells
    /// whose surroundings pass the safety margin.
    fn scan_ring(
        &self,
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        inset: u32,
    ) -> Vec<SpawnCandidate> {
        ring_cells(view.dimensions(), inset)
            .into_iter()
            .filter(|cell| view.is_walkable(*cell) && self.safety_margin_holds(view, mapping, *cell))
            .map(|cell| SpawnCandidate {
                cell,
                position: mapping.cell_center(cell),
            })
            .collect()
    }

    /// Requires at least `safety_min_clear` of the eight probe points around
    /// the cell center to be unobstructed. Probes landing off the grid count
    /// as clear; only genuine hazard tiles reject a candidate.
    fn safety_margin_holds(
        &self,
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        cell: CellCoord,
    ) -> bool {
        let center = mapping.cell_center(cell);
        let clear = probe_offsets(self.config.safety_radius)
            .into_iter()
            .filter(|(dx, dy)| {
                let probe = WorldPosition::new(center.x() + dx, center.y() + dy);
                !probe_blocked(view, mapping, probe)
            })
            .count();
        clear as u32 >= self.config.safety_min_clear
    }

    /// Draws up to `interior_attempts` uniform cells from the grid interior,
    /// keeping the walkable ones. The safety margin is skipped here; interior
    /// tiles rarely border hazards and this tier only runs once the stricter
    /// scans came up empty.
    fn interior_sampling(
        &self,
        view: WalkabilityView<'_>,
        mapping: &GridMapping,
        rng: &mut SplitMix64,
    ) -> Vec<SpawnCandidate> {
        let (columns, rows) = view.dimensions();
        if columns == 0 || rows == 0 {
            return Vec::new();
        }

        let (column_min, column_max) = interior_range(columns);
        let (row_min, row_max) = interior_range(rows);

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for _ in 0..self.config.interior_attempts {
            let cell = CellCoord::new(
                sample_uniform_inclusive(rng, column_min, column_max),
                sample_uniform_inclusive(rng, row_min, row_max),
            );
            if view.is_walkable(cell) && seen.insert(cell) {
                candidates.push(SpawnCandidate {
                    cell,
                    position: mapping.cell_center(cell),
                });
            }
        }

        candidates
    }

    /// Synthesizes a usable result when every other tier failed.
    ///
    /// The first point is unconditional — a corner cell inset from the grid
    /// edge, walkable or not — so spawning proceeds in a visibly degraded but
    /// non-crashing way. The remaining inset corners and a batch of random
    /// cells are appended when they keep a minimum distance from the player.
    fn last_resort(
        &self,
        dimensions: (u32, u32),
        mapping: &GridMapping,
        player: WorldPosition,
        rng: &mut SplitMix64,
    ) -> Vec<SpawnCandidate> {
        let (columns, rows) = dimensions;
        let near = inset_coordinate(columns);
        let far_column = far_inset_coordinate(columns);
        let near_row = inset_coordinate(rows);
        let far_row = far_inset_coordinate(rows);

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        let synthesized = CellCoord::new(near, near_row);
        let _ = seen.insert(synthesized);
        candidates.push(SpawnCandidate {
            cell: synthesized,
            position: mapping.cell_center(synthesized),
        });

        let corners = [
            CellCoord::new(far_column, near_row),
            CellCoord::new(near, far_row),
            CellCoord::new(far_column, far_row),
        ];
        for cell in corners {
            let position = mapping.cell_center(cell);
            if position.distance(player) >= self.config.min_player_distance && seen.insert(cell) {
                candidates.push(SpawnCandidate { cell, position });
            }
        }

        if columns > 0 && rows > 0 {
            for _ in 0..self.config.interior_attempts {
                let cell = CellCoord::new(
                    sample_uniform_inclusive(rng, 0, columns - 1),
                    sample_uniform_inclusive(rng, 0, rows - 1),
                );
                let position = mapping.cell_center(cell);
                if position.distance(player) >= self.config.min_player_distance
                    && seen.insert(cell)
                {
                    candidates.push(SpawnCandidate { cell, position });
                }
            }
        }

        candidates
    }
}

/// Cells of the rectangular ring at the provided inset, in deterministic
/// order: top row, bottom row, then the two side columns.
fn ring_cells(dimensions: (u32, u32), inset: u32) -> Vec<CellCoord> {
    let (columns, rows) = dimensions;
    let Some(last_column) = columns.checked_sub(1).and_then(|v| v.checked_sub(inset)) else {
        return Vec::new();
    };
    let Some(last_row) = rows.checked_sub(1).and_then(|v| v.checked_sub(inset)) else {
        return Vec::new();
    };
    if last_column < inset || last_row < inset {
        return Vec::new();
    }

    let mut cells = Vec::new();
    for column in inset..=last_column {
        cells.push(CellCoord::new(column, inset));
    }
    if last_row > inset {
        for column in inset..=last_column {
            cells.push(CellCoord::new(column, last_row));
        }
    }
    if last_column > inset {
        for row in (inset + 1)..last_row {
            cells.push(CellCoord::new(inset, row));
            cells.push(CellCoord::new(last_column, row));
        }
    } else {
        for row in (inset + 1)..last_row {
            cells.push(CellCoord::new(inset, row));
        }
    }

    cells
}

fn interior_range(extent: u32) -> (u32, u32) {
    if extent > 2 {
        (1, extent - 2)
    } else {
        (0, extent - 1)
    }
}

fn inset_coordinate(extent: u32) -> u32 {
    LAST_RESORT_INSET.min(extent.saturating_sub(1))
}

fn far_inset_coordinate(extent: u32) -> u32 {
    extent
        .saturating_sub(1)
        .saturating_sub(LAST_RESORT_INSET)
        .max(inset_coordinate(extent))
}

fn probe_offsets(radius: f32) -> [(f32, f32); 8] {
    let diagonal = radius * FRAC_1_SQRT_2;
    [
        (radius, 0.0),
        (-radius, 0.0),
        (0.0, radius),
        (0.0, -radius),
        (diagonal, diagonal),
        (diagonal, -diagonal),
        (-diagonal, diagonal),
        (-diagonal, -diagonal),
    ]
}

fn probe_blocked(view: WalkabilityView<'_>, mapping: &GridMapping, probe: WorldPosition) -> bool {
    match mapping.world_to_cell(probe) {
        Some(cell) => view.in_bounds(cell) && !view.is_walkable(cell),
        None => false,
    }
}

fn derive_base_seed(global_seed: u64, wave: WaveNumber) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.get().to_le_bytes());
    finalize_seed(hasher)
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

fn sample_uniform_inclusive(rng: &mut SplitMix64, min: u32, max: u32) -> u32 {
    if min == max {
        return min;
    }

    let range = u64::from(max.saturating_sub(min)) + 1;
    let value = rng.next_u64();
    let offset = value % range;
    min.saturating_add(offset as u32)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}
