//! # Host Traits
//!
//! Everything the harvest needs from the game server, expressed as traits
//! the host implements.
//!
//! ```text
//! veinminer defines:      the host implements:
//! ┌──────────────────┐    ┌──────────────────┐
//! │ trait HostWorld  │ ←─ │ impl HostWorld   │  block lookup, clear, drops, effects
//! │ trait Miner      │ ←─ │ impl Miner       │  permissions, inventory, chat
//! └──────────────────┘    └──────────────────┘
//! ```
//!
//! All calls are made on the thread that reported the break, which for a
//! game server is its main simulation thread. Messages may contain
//! `&`-prefixed colour codes for the host to render.

use serde::{Deserialize, Serialize};
use veinminer_core::{BlockKind, BlockSource, Coordinate, ToolKind};
use veinminer_stats::PlayerId;

/// Permission required to vein mine.
pub const USE_PERMISSION: &str = "veinminer.use";

/// Permission required to view one's statistics.
pub const STATS_PERMISSION: &str = "veinminer.stats";

/// A stack of items.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item identifier.
    pub item: String,
    /// Number of items.
    pub count: u32,
}

impl ItemStack {
    /// Creates a stack.
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }
}

/// What breaking one block yields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockDrops {
    /// Item drops, already accounting for the tool's enchantments.
    pub items: Vec<ItemStack>,
    /// Experience.
    pub xp: u32,
}

/// The item held while mining.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolItem {
    /// Tool identifier.
    pub kind: ToolKind,
    /// Damage taken so far.
    pub damage: u32,
    /// Damage at which the tool breaks; 0 means it never does.
    pub max_durability: u32,
}

impl ToolItem {
    /// Creates a tool with finite durability.
    pub fn new(kind: impl Into<ToolKind>, damage: u32, max_durability: u32) -> Self {
        Self {
            kind: kind.into(),
            damage,
            max_durability,
        }
    }

    /// Creates a tool that never breaks.
    pub fn unbreakable(kind: impl Into<ToolKind>) -> Self {
        Self::new(kind, 0, 0)
    }

    /// Returns true if the tool has finite durability.
    #[must_use]
    pub const fn is_breakable(&self) -> bool {
        self.max_durability > 0
    }

    /// Durability left; `None` if unbreakable.
    #[must_use]
    pub const fn remaining(&self) -> Option<u32> {
        if self.is_breakable() {
            Some(self.max_durability.saturating_sub(self.damage))
        } else {
            None
        }
    }

    /// Returns true if a breakable tool has no durability left.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.remaining(), Some(0))
    }

    /// Applies `cost` damage. Returns true if the tool broke.
    pub fn apply_damage(&mut self, cost: u32) -> bool {
        if !self.is_breakable() {
            return false;
        }
        self.damage = self.damage.saturating_add(cost);
        self.damage >= self.max_durability
    }
}

/// Sounds the harvest plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HarvestSound {
    /// A vein was mined.
    Complete,
    /// The tool broke.
    ToolBreak,
}

/// The world the vein lives in.
pub trait HostWorld: BlockSource {
    /// Computes what breaking the block at `at` with `tool` yields.
    ///
    /// # Errors
    ///
    /// Returns a description if the host cannot compute drops; the block is
    /// then left alone.
    fn compute_drops(&self, at: Coordinate, kind: &BlockKind, tool: &ToolItem) -> Result<BlockDrops, String>;

    /// Replaces the block at `at` with air, without drops.
    ///
    /// # Errors
    ///
    /// Returns a description if the block could not be cleared.
    fn clear_block(&mut self, at: Coordinate) -> Result<(), String>;

    /// Drops an item stack at `at`.
    fn drop_item(&mut self, at: Coordinate, item: &ItemStack);

    /// Shows the break particle of `kind` at `at`.
    fn spawn_particle(&mut self, at: Coordinate, kind: &BlockKind);

    /// Spawns one experience orb worth `amount` at `at`.
    fn spawn_xp_orb(&mut self, at: Coordinate, amount: u32);

    /// Plays `sound` to the player.
    fn play_sound(&mut self, player: PlayerId, sound: HarvestSound);
}

/// The player breaking the block.
pub trait Miner {
    /// Stable identity.
    fn id(&self) -> PlayerId;

    /// Display name.
    fn name(&self) -> &str;

    /// Returns true if the player holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;

    /// Returns true if the player is crouching.
    fn is_sneaking(&self) -> bool;

    /// Zone (world) the player is in.
    fn zone(&self) -> &str;

    /// The held tool; `None` for an empty hand.
    fn held_tool(&self) -> Option<ToolItem>;

    /// Replaces the held tool; `None` empties the hand.
    fn set_held_tool(&mut self, tool: Option<ToolItem>);

    /// Puts as much of `item` into the inventory as fits and returns how
    /// many items did not fit.
    fn give(&mut self, item: &ItemStack) -> u32;

    /// Shows a short tip above the hotbar.
    fn send_tip(&mut self, message: &str);

    /// Sends a chat message.
    fn send_message(&mut self, message: &str);
}
