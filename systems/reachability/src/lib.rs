#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reachability validation for spawn placement.
//!
//! A [`ReachableSet`] captures every cell connected to the player's cell via
//! 4-directional adjacency through walkable cells only. It is recomputed at
//! wave setup, not per tick, and discarded once candidates are filtered.

use std::collections::VecDeque;

use horde_core::{CellCoord, SpawnCandidate, WalkabilityView};

/// Dense membership grid of cells reachable from a starting cell.
///
/// Cells default to unreachable; an empty set (zero reachable cells) is the
/// signal that the starting cell itself was out of bounds or blocked.
#[derive(Clone, Debug)]
pub struct ReachableSet {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
    reachable_count: usize,
}

impl ReachableSet {
    /// Runs a breadth-first search over the walkability grid from `start`.
    ///
    /// When `start` lies outside the grid or on a blocked cell the result is
    /// empty; callers treat that as "nothing validated" and fall back to
    /// unfiltered candidates instead of refusing to spawn.
    #[must_use]
    pub fn compute(view: WalkabilityView<'_>, start: CellCoord) -> Self {
        let (columns, rows) = view.dimensions();
        let width = usize::try_from(columns).unwrap_or(0);
        let height = usize::try_from(rows).unwrap_or(0);
        let cell_count = width.checked_mul(height).unwrap_or(0);

        let mut set = Self {
            columns,
            rows,
            cells: vec![false; cell_count],
            reachable_count: 0,
        };

        if cell_count == 0 || !view.is_walkable(start) {
            return set;
        }

        let mut queue = VecDeque::new();
        if let Some(start_index) = index(width, start) {
            set.cells[start_index] = true;
            set.reachable_count = 1;
            queue.push_back(start);
        }

        while let Some(cell) = queue.pop_front() {
            for neighbor in neighbors(cell, columns, rows) {
                if !view.is_walkable(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = index(width, neighbor) else {
                    continue;
                };

                if set.cells[neighbor_index] {
                    continue;
                }

                set.cells[neighbor_index] = true;
                set.reachable_count += 1;
                queue.push_back(neighbor);
            }
        }

        set
    }

    /// Reports whether the provided cell was reached by the search.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return false;
        }

        let width = match usize::try_from(self.columns) {
            Ok(width) => width,
            Err(_) => return false,
        };
        index(width, cell)
            .and_then(|offset| self.cells.get(offset).copied())
            .unwrap_or(false)
    }

    /// Number of cells reached by the search.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.reachable_count
    }

    /// Reports whether no cell at all was reached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reachable_count == 0
    }

    /// Dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

/// Keeps only candidates whose derived cell is reachable.
///
/// An empty reachable set means validation had nothing to say (the player was
/// off-grid or standing on blocked terrain); the candidates pass through
/// untouched so spawning degrades gracefully instead of stalling.
#[must_use]
pub fn filter_candidates(
    candidates: Vec<SpawnCandidate>,
    reachable: &ReachableSet,
) -> Vec<SpawnCandidate> {
    if reachable.is_empty() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|candidate| reachable.is_reachable(candidate.cell))
        .collect()
}

fn neighbors(cell: CellCoord, columns: u32, rows: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < columns {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < rows {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
