//! # Player Statistics
//!
//! Lifetime counters for one player.
//!
//! ## Concurrency
//!
//! Every counter is its own atomic, so concurrent recorders for the same
//! player never lose an update and never violate a counter's invariant
//! (`total_*` only grow, `largest_vein` is a running max).
//!
//! The four updates of one record are not a single transaction, but a
//! snapshot must never observe half of them. Recorders therefore hold the
//! *shared* side of a gate while they update, and [`PlayerStats::snapshot`]
//! takes the *exclusive* side for the few loads it needs. Recorders never
//! block each other; a snapshot waits only for records already in progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a player across sessions.
pub type PlayerId = Uuid;

/// Milliseconds since the Unix epoch, saturating to zero before it.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Live, concurrently updated statistics of one player.
#[derive(Debug)]
pub struct PlayerStats {
    /// Display name at the time the record was created.
    name: String,
    /// Number of vein-mining events.
    total_veins: AtomicU64,
    /// Blocks broken across all veins.
    total_blocks: AtomicU64,
    /// Largest single vein.
    largest_vein: AtomicU64,
    /// Last vein-mining time (ms since epoch), 0 if never.
    last_mined_at: AtomicU64,
    /// Shared by recorders, exclusive for snapshots.
    gate: RwLock<()>,
}

/// Running totals before and after one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordDelta {
    /// `total_blocks` before the record.
    pub previous_total: u64,
    /// `total_blocks` after the record.
    pub new_total: u64,
}

impl PlayerStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_snapshot(&StatsSnapshot {
            name: name.into(),
            ..StatsSnapshot::default()
        })
    }

    /// Rebuilds live statistics from a snapshot (e.g. on load).
    #[must_use]
    pub fn from_snapshot(snapshot: &StatsSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            total_veins: AtomicU64::new(snapshot.total_veins),
            total_blocks: AtomicU64::new(snapshot.total_blocks),
            largest_vein: AtomicU64::new(snapshot.largest_vein),
            last_mined_at: AtomicU64::new(snapshot.last_mined_at),
            gate: RwLock::new(()),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records one vein of `blocks` blocks mined at `now` (ms since epoch).
    pub fn record(&self, blocks: u64, now: u64) -> RecordDelta {
        let _shared = self.gate.read();

        self.total_veins.fetch_add(1, Ordering::AcqRel);
        let previous_total = self.total_blocks.fetch_add(blocks, Ordering::AcqRel);
        // fetch_max so a racing older timestamp never moves the clock back
        self.last_mined_at.fetch_max(now, Ordering::AcqRel);
        self.largest_vein.fetch_max(blocks, Ordering::AcqRel);

        RecordDelta {
            previous_total,
            new_total: previous_total.saturating_add(blocks),
        }
    }

    /// Consistent copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let _exclusive = self.gate.write();
        StatsSnapshot {
            name: self.name.clone(),
            total_veins: self.total_veins.load(Ordering::Acquire),
            total_blocks: self.total_blocks.load(Ordering::Acquire),
            largest_vein: self.largest_vein.load(Ordering::Acquire),
            last_mined_at: self.last_mined_at.load(Ordering::Acquire),
        }
    }

    /// Current `total_blocks` without taking the gate.
    #[must_use]
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks.load(Ordering::Acquire)
    }
}

/// Immutable point-in-time copy of a player's statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Display name.
    pub name: String,
    /// Number of vein-mining events.
    pub total_veins: u64,
    /// Blocks broken across all veins.
    pub total_blocks: u64,
    /// Largest single vein.
    pub largest_vein: u64,
    /// Last vein-mining time (ms since epoch), 0 if never.
    pub last_mined_at: u64,
}

impl StatsSnapshot {
    /// Zeroed statistics for a player who never vein-mined.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns true if the player never vein-mined.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_veins == 0
    }
}
