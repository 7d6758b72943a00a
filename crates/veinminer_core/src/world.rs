//! # World Query Seam
//!
//! The engine never owns the world. Hosts implement [`BlockSource`] over
//! their own chunk storage; [`SparseWorld`] is a small in-memory world for
//! hosts without one (and for tests and benches).

use std::collections::HashMap;

use crate::coords::Coordinate;
use crate::error::{WorldError, WorldResult};
use crate::kind::BlockKind;

/// Read access to block identities.
///
/// Called from the host's main thread during a harvest. Implementations
/// report unloaded or invalid cells as errors (or as a sentinel kind such
/// as air); either way the search treats them as non-matching.
pub trait BlockSource {
    /// Returns the kind of block at `at`.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] when the cell cannot be inspected.
    fn block_kind_at(&self, at: Coordinate) -> WorldResult<BlockKind>;
}

impl<F> BlockSource for F
where
    F: Fn(Coordinate) -> WorldResult<BlockKind>,
{
    fn block_kind_at(&self, at: Coordinate) -> WorldResult<BlockKind> {
        self(at)
    }
}

/// Sparse in-memory world: unset cells are air.
///
/// Optional vertical limits make cells outside `[min_y, max_y]` report
/// [`WorldError::OutOfBounds`].
#[derive(Clone, Debug)]
pub struct SparseWorld {
    /// Non-air cells.
    cells: HashMap<Coordinate, BlockKind>,
    /// Build limits as (min_y, max_y), inclusive.
    height_limits: Option<(i32, i32)>,
    /// Kind reported for empty cells.
    air: BlockKind,
}

impl SparseWorld {
    /// Creates an empty, unbounded world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            height_limits: None,
            air: BlockKind::air(),
        }
    }

    /// Restricts the world to `min_y..=max_y`.
    #[must_use]
    pub fn with_height_limits(mut self, min_y: i32, max_y: i32) -> Self {
        self.height_limits = Some((min_y, max_y));
        self
    }

    fn in_bounds(&self, at: Coordinate) -> bool {
        match self.height_limits {
            Some((min_y, max_y)) => (min_y..=max_y).contains(&at.y),
            None => true,
        }
    }

    /// Places `kind` at `at`. Placing air clears the cell.
    pub fn set(&mut self, at: Coordinate, kind: BlockKind) {
        if kind == self.air {
            self.cells.remove(&at);
        } else {
            self.cells.insert(at, kind);
        }
    }

    /// Fills the inclusive box spanned by `from` and `to` with `kind`.
    pub fn fill(&mut self, from: Coordinate, to: Coordinate, kind: &BlockKind) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    self.set(Coordinate::new(x, y, z), kind.clone());
                }
            }
        }
    }

    /// Clears the cell at `at`. Returns false if it was out of bounds.
    pub fn clear(&mut self, at: Coordinate) -> bool {
        if !self.in_bounds(at) {
            return false;
        }
        self.cells.remove(&at);
        true
    }

    /// Returns the kind at `at`, air if unset, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, at: Coordinate) -> Option<&BlockKind> {
        if !self.in_bounds(at) {
            return None;
        }
        Some(self.cells.get(&at).unwrap_or(&self.air))
    }

    /// Number of non-air cells.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.cells.len()
    }

    /// Counts the cells holding `kind`.
    #[must_use]
    pub fn count_of(&self, kind: &BlockKind) -> usize {
        self.cells.values().filter(|k| *k == kind).count()
    }
}

impl Default for SparseWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSource for SparseWorld {
    fn block_kind_at(&self, at: Coordinate) -> WorldResult<BlockKind> {
        self.get(at).cloned().ok_or(WorldError::OutOfBounds(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_cells_are_air() {
        let world = SparseWorld::new();
        assert_eq!(world.block_kind_at(Coordinate::ORIGIN), Ok(BlockKind::air()));
    }

    #[test]
    fn test_height_limits() {
        let world = SparseWorld::new().with_height_limits(0, 10);
        let below = Coordinate::new(0, -1, 0);
        assert_eq!(world.block_kind_at(below), Err(WorldError::OutOfBounds(below)));
    }

    #[test]
    fn test_fill_and_clear() {
        let mut world = SparseWorld::new();
        let log = BlockKind::new("oak_log");
        world.fill(Coordinate::new(0, 0, 0), Coordinate::new(0, 4, 0), &log);
        assert_eq!(world.count_of(&log), 5);

        assert!(world.clear(Coordinate::new(0, 2, 0)));
        assert_eq!(world.count_of(&log), 4);
        assert_eq!(world.solid_count(), 4);
    }
}
