//! # Vein Search
//!
//! Bounded breadth-first flood fill over 26-connected cells of one kind.
//!
//! ## Algorithm
//!
//! ```text
//!   seed ──> lookup(seed) == kind? ──no──> empty vein
//!               │ yes
//!               ▼
//!   ┌──> pop frontier ──> add to vein ──> vein full? ──yes──> done
//!   │                                        │ no
//!   │                                        ▼
//!   │          for each of the 26 neighbours not seen yet:
//!   │            lookup(n) == kind ? push to frontier : dead end
//!   │            (stop probing once vein + frontier == cap)
//!   └──────────────────────────────┘
//! ```
//!
//! Non-matching cells are dead ends: their neighbours are never explored
//! through them. Every cell is looked up at most once, and the frontier
//! only ever holds matching cells the cap can still absorb, so it never
//! grows past `max_blocks`.

use std::collections::{HashSet, VecDeque};

use crate::coords::Coordinate;
use crate::kind::BlockKind;
use crate::world::BlockSource;

/// Default cap on the size of a vein.
pub const DEFAULT_MAX_BLOCKS: usize = 64;

/// Upper bound on up-front allocation for very large caps.
const PREALLOC_LIMIT: usize = 4096;

/// A connected set of same-kind cells discovered from a seed.
///
/// Created fresh for every harvest attempt and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vein {
    /// Kind shared by every cell of the vein.
    kind: BlockKind,
    /// The seed cell the search started from.
    origin: Coordinate,
    /// Cells in discovery (breadth-first) order; the seed comes first.
    blocks: Vec<Coordinate>,
    /// Cap the search ran with.
    max_blocks: usize,
    /// World lookups the search performed.
    lookups: usize,
}

impl Vein {
    fn empty(kind: BlockKind, origin: Coordinate, max_blocks: usize) -> Self {
        Self {
            kind,
            origin,
            blocks: Vec::new(),
            max_blocks,
            lookups: 0,
        }
    }

    /// The kind of every cell in the vein.
    #[must_use]
    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    /// The seed cell.
    #[must_use]
    pub const fn origin(&self) -> Coordinate {
        self.origin
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the seed did not match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns true if the search stopped because the cap was reached.
    #[must_use]
    pub fn hit_cap(&self) -> bool {
        self.blocks.len() >= self.max_blocks
    }

    /// Number of world lookups the search performed.
    #[must_use]
    pub const fn lookups(&self) -> usize {
        self.lookups
    }

    /// Cells in discovery order.
    #[must_use]
    pub fn blocks(&self) -> &[Coordinate] {
        &self.blocks
    }

    /// Iterates cells in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.blocks.iter()
    }

    /// Returns true if `at` is part of the vein.
    #[must_use]
    pub fn contains(&self, at: Coordinate) -> bool {
        self.blocks.contains(&at)
    }

    /// Cells sorted by (x, y, z), for order-independent comparison.
    #[must_use]
    pub fn sorted(&self) -> Vec<Coordinate> {
        let mut out = self.blocks.clone();
        out.sort_unstable();
        out
    }
}

impl<'a> IntoIterator for &'a Vein {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Returns true if the cell at `at` currently holds `kind`.
///
/// Lookup failures (unloaded region, out of bounds, host error) count as
/// "no match".
fn matches<S: BlockSource + ?Sized>(world: &S, at: Coordinate, kind: &BlockKind) -> bool {
    match world.block_kind_at(at) {
        Ok(found) => found == *kind,
        Err(err) => {
            tracing::trace!(%at, error = %err, "lookup failed, treating as no match");
            false
        }
    }
}

/// Finds the vein of `kind` containing `origin`, capped at `max_blocks`.
///
/// A cap of zero is treated as one. Returns an empty vein if the seed no
/// longer holds `kind` (the world may have changed since the caller
/// validated the break).
pub fn find_vein<S: BlockSource + ?Sized>(
    origin: Coordinate,
    kind: &BlockKind,
    max_blocks: usize,
    world: &S,
) -> Vein {
    let max_blocks = max_blocks.max(1);
    let mut vein = Vein::empty(kind.clone(), origin, max_blocks);

    vein.lookups += 1;
    if !matches(world, origin, kind) {
        return vein;
    }

    let reserve = max_blocks.min(PREALLOC_LIMIT);
    let mut seen: HashSet<Coordinate> = HashSet::with_capacity(reserve * 4);
    let mut frontier: VecDeque<Coordinate> = VecDeque::with_capacity(reserve);
    seen.insert(origin);
    frontier.push_back(origin);

    while vein.blocks.len() < max_blocks {
        let Some(current) = frontier.pop_front() else {
            break;
        };

        vein.blocks.push(current);
        if vein.blocks.len() >= max_blocks {
            break;
        }

        for neighbor in current.neighbors() {
            // Frontier cells always match, so once vein + frontier reach the
            // cap nothing further can make it into the result.
            if vein.blocks.len() + frontier.len() >= max_blocks {
                break;
            }
            if !seen.insert(neighbor) {
                continue;
            }
            vein.lookups += 1;
            if matches(world, neighbor, kind) {
                frontier.push_back(neighbor);
            }
        }
    }

    vein
}
