//! # VeinMiner Core
//!
//! The vein discovery engine: everything needed to decide whether a break
//! qualifies for vein mining and to find the connected vein it belongs to.
//!
//! ## Design Principles
//!
//! 1. **The world is external** - the engine only ever asks "what kind is at
//!    this coordinate?" through [`BlockSource`]; failures read as "no match"
//! 2. **Bounded search** - a vein never exceeds its configured cap, and the
//!    frontier never holds more candidates than the cap can still absorb
//! 3. **No hidden statics** - the eligibility cache is an owned value with an
//!    explicit [`ToolEligibilityCache::clear`] for the reload path
//!
//! ## Example
//!
//! ```rust,ignore
//! use veinminer_core::{find_vein, BlockKind, Coordinate, SparseWorld};
//!
//! let mut world = SparseWorld::new();
//! let iron = BlockKind::new("minecraft:iron_ore");
//! world.set(Coordinate::new(0, 0, 0), iron.clone());
//! world.set(Coordinate::new(1, 1, 0), iron.clone());
//!
//! let vein = find_vein(Coordinate::new(0, 0, 0), &iron, 64, &world);
//! assert_eq!(vein.len(), 2);
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod coords;
pub mod eligibility;
pub mod error;
pub mod kind;
pub mod search;
pub mod world;

pub use coords::Coordinate;
pub use eligibility::{ToolEligibilityCache, DEFAULT_CACHE_CAPACITY};
pub use error::{WorldError, WorldResult};
pub use kind::{BlockClass, BlockKind, ToolClass, ToolKind};
pub use search::{find_vein, Vein, DEFAULT_MAX_BLOCKS};
pub use world::{BlockSource, SparseWorld};
