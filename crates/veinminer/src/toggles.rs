//! Per-player opt-out of vein mining.

use std::collections::HashSet;

use parking_lot::RwLock;
use veinminer_stats::PlayerId;

/// Players who switched vein mining off for themselves.
///
/// Vein mining is on by default; only opted-out players are stored, and
/// [`ToggleRegistry::forget`] drops them when they leave.
#[derive(Debug, Default)]
pub struct ToggleRegistry {
    disabled: RwLock<HashSet<PlayerId>>,
}

impl ToggleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the player's setting. Returns true if vein mining is now on.
    pub fn toggle(&self, player: PlayerId) -> bool {
        let mut disabled = self.disabled.write();
        if disabled.remove(&player) {
            true
        } else {
            disabled.insert(player);
            false
        }
    }

    /// Turns vein mining on. Returns false if it already was.
    pub fn enable(&self, player: PlayerId) -> bool {
        self.disabled.write().remove(&player)
    }

    /// Turns vein mining off. Returns false if it already was.
    pub fn disable(&self, player: PlayerId) -> bool {
        self.disabled.write().insert(player)
    }

    /// Returns true if the player opted out.
    #[must_use]
    pub fn is_disabled(&self, player: PlayerId) -> bool {
        self.disabled.read().contains(&player)
    }

    /// Forgets the player's setting.
    pub fn forget(&self, player: PlayerId) {
        self.disabled.write().remove(&player);
    }

    /// Number of opted-out players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.disabled.read().len()
    }

    /// Returns true if nobody opted out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disabled.read().is_empty()
    }
}
