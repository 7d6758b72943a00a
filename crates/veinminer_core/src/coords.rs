//! Block coordinates.
//!
//! A [`Coordinate`] is a plain value type: two coordinates with equal
//! components are equal and hash identically, however they were built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer position of a block cell in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// X component
    pub x: i32,
    /// Y component (vertical)
    pub y: i32,
    /// Z component
    pub z: i32,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The origin cell.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Returns this coordinate shifted by the given deltas.
    ///
    /// Wraps on overflow so that probing at the edge of the `i32` range
    /// yields a (non-matching) coordinate instead of panicking.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.x.wrapping_add(dx),
            self.y.wrapping_add(dy),
            self.z.wrapping_add(dz),
        )
    }

    /// Iterates the 26 cells of the surrounding 3x3x3 cube, centre excluded.
    ///
    /// Faces, edges and corners are all included.
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// Chebyshev distance (max of the per-axis distances).
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }

    /// Returns true if `other` is one of the 26 neighbours of `self`.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }
}

impl From<(i32, i32, i32)> for Coordinate {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Coordinate> for (i32, i32, i32) {
    fn from(c: Coordinate) -> Self {
        (c.x, c.y, c.z)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Offsets of the full 3x3x3 cube minus the centre.
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 26] = build_neighbor_offsets();

const fn build_neighbor_offsets() -> [(i32, i32, i32); 26] {
    let mut out = [(0, 0, 0); 26];
    let mut i = 0;
    let mut dx = -1;
    while dx <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dz = -1;
            while dz <= 1 {
                if !(dx == 0 && dy == 0 && dz == 0) {
                    out[i] = (dx, dy, dz);
                    i += 1;
                }
                dz += 1;
            }
            dy += 1;
        }
        dx += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equal_components_are_one_key() {
        let mut set = HashSet::new();
        set.insert(Coordinate::new(3, -4, 5));
        set.insert(Coordinate::from((3, -4, 5)));
        set.insert(Coordinate::ORIGIN.offset(3, -4, 5));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_twenty_six_unique_neighbors() {
        let centre = Coordinate::new(10, 20, 30);
        let neighbors: HashSet<_> = centre.neighbors().collect();

        assert_eq!(neighbors.len(), 26);
        assert!(!neighbors.contains(&centre));
        assert!(neighbors.iter().all(|n| centre.is_adjacent(*n)));
        // Corners are included
        assert!(neighbors.contains(&Coordinate::new(11, 21, 31)));
        assert!(neighbors.contains(&Coordinate::new(9, 19, 29)));
    }

    #[test]
    fn test_offset_wraps_at_range_edge() {
        let edge = Coordinate::new(i32::MAX, 0, i32::MIN);
        let shifted = edge.offset(1, 0, -1);
        assert_eq!(shifted, Coordinate::new(i32::MIN, 0, i32::MAX));
    }

    #[test]
    fn test_adjacency() {
        let a = Coordinate::new(0, 0, 0);
        assert!(a.is_adjacent(Coordinate::new(1, 1, 1)));
        assert!(!a.is_adjacent(Coordinate::new(2, 0, 0)));
        assert!(!a.is_adjacent(a));
    }
}
