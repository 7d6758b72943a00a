//! # Milestone Tracker
//!
//! Grants each cumulative-blocks threshold to a player at most once in the
//! player's lifetime.
//!
//! ## Per-player state machine
//!
//! ```text
//!   unhydrated ──(first touch: read persisted set)──> hydrated(S)
//!                                                       │
//!                                                       └─ S only grows
//! ```
//!
//! Absence of an in-memory set is not evidence that nothing was achieved:
//! a player is hydrated before any threshold is compared, so a restarted
//! process never re-grants. Hydration runs once per player even when
//! several harvests touch the player concurrently.
//!
//! Once the startup load has handed over the persisted sets with
//! [`MilestoneTracker::preload`], hydration is a map lookup and never
//! touches the repository. The repository is only read when no document
//! was loaded.
//!
//! The insert into the achieved set is the single arbiter of "first time".

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::player::PlayerId;
use crate::repository::StatsRepository;

/// Thresholds used when none are configured.
pub const DEFAULT_THRESHOLDS: [u64; 5] = [100, 500, 1_000, 5_000, 10_000];

/// A milestone granted to a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MilestoneGrant {
    /// Who earned it.
    pub player: PlayerId,
    /// Display name at grant time.
    pub player_name: String,
    /// The threshold crossed.
    pub threshold: u64,
    /// Lifetime total that crossed it.
    pub total_blocks: u64,
}

/// Lazily hydrated achieved set of one player.
type AchievedSlot = Arc<OnceLock<Mutex<BTreeSet<u64>>>>;

/// Tracks achieved milestones for every player touched this process.
pub struct MilestoneTracker {
    /// Ascending, de-duplicated thresholds.
    thresholds: Vec<u64>,
    /// Achieved sets by player.
    achieved: RwLock<HashMap<PlayerId, AchievedSlot>>,
    /// Where persisted sets are hydrated from; `None` means nothing is
    /// persisted and every player starts empty.
    source: Option<Arc<dyn StatsRepository>>,
    /// Persisted sets handed over by the startup load.
    preloaded: RwLock<Option<HashMap<PlayerId, Vec<u64>>>>,
}

impl MilestoneTracker {
    /// Creates a tracker. An empty `thresholds` selects
    /// [`DEFAULT_THRESHOLDS`].
    #[must_use]
    pub fn new(thresholds: &[u64], source: Option<Arc<dyn StatsRepository>>) -> Self {
        let mut thresholds = if thresholds.is_empty() {
            DEFAULT_THRESHOLDS.to_vec()
        } else {
            thresholds.to_vec()
        };
        thresholds.sort_unstable();
        thresholds.dedup();

        Self {
            thresholds,
            achieved: RwLock::new(HashMap::new()),
            source,
            preloaded: RwLock::new(None),
        }
    }

    /// Configured thresholds, ascending.
    #[must_use]
    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    /// Hands over the persisted sets read by the startup load.
    ///
    /// Players hydrated after this start from `persisted`; a player absent
    /// from it has no persisted milestones. Replaces any earlier preload.
    pub fn preload(&self, persisted: HashMap<PlayerId, Vec<u64>>) {
        tracing::debug!(players = persisted.len(), "preloaded persisted milestones");
        *self.preloaded.write() = Some(persisted);
    }

    /// Returns true once [`MilestoneTracker::preload`] has run.
    #[must_use]
    pub fn is_preloaded(&self) -> bool {
        self.preloaded.read().is_some()
    }

    /// The player's persisted set from the preload, `None` if nothing was
    /// preloaded.
    fn preloaded_set(&self, player: PlayerId) -> Option<Vec<u64>> {
        self.preloaded
            .read()
            .as_ref()
            .map(|sets| sets.get(&player).cloned().unwrap_or_default())
    }

    fn slot(&self, player: PlayerId) -> AchievedSlot {
        if let Some(slot) = self.achieved.read().get(&player) {
            return Arc::clone(slot);
        }
        let mut achieved = self.achieved.write();
        Arc::clone(achieved.entry(player).or_default())
    }

    /// Builds the persisted set for `player`, from the preload when there
    /// is one and from the repository otherwise.
    ///
    /// A failed read is logged and the player starts from what could be
    /// read (nothing); the attempt still counts as the hydration.
    fn hydrate(&self, player: PlayerId) -> Mutex<BTreeSet<u64>> {
        let Some(source) = &self.source else {
            return Mutex::new(BTreeSet::new());
        };
        if let Some(found) = self.preloaded_set(player) {
            return Mutex::new(found.into_iter().collect());
        }
        match source.load_milestones(player) {
            Ok(found) => {
                let set: BTreeSet<u64> = found.unwrap_or_default().into_iter().collect();
                tracing::debug!(%player, milestones = set.len(), "hydrated milestones");
                Mutex::new(set)
            }
            Err(e) => {
                tracing::warn!(%player, error = %e, "failed to hydrate milestones, starting empty");
                Mutex::new(BTreeSet::new())
            }
        }
    }

    /// Runs `f` on the player's achieved set, hydrating it first if this is
    /// the first touch.
    fn with_achieved<R>(&self, player: PlayerId, f: impl FnOnce(&mut BTreeSet<u64>) -> R) -> R {
        let slot = self.slot(player);
        let set = slot.get_or_init(|| self.hydrate(player));
        let mut set = set.lock();
        f(&mut set)
    }

    /// Grants every threshold crossed by moving from `previous_total` to
    /// `new_total` that the player does not already hold.
    ///
    /// Returns the newly granted thresholds, ascending.
    pub fn check_and_grant(&self, player: PlayerId, previous_total: u64, new_total: u64) -> Vec<u64> {
        self.with_achieved(player, |set| {
            self.thresholds
                .iter()
                .copied()
                .filter(|&t| new_total >= t && previous_total < t)
                .filter(|&t| set.insert(t))
                .collect()
        })
    }

    /// The player's achieved thresholds, hydrating if needed.
    #[must_use]
    pub fn achieved(&self, player: PlayerId) -> Vec<u64> {
        self.with_achieved(player, |set| set.iter().copied().collect())
    }

    /// The player's achieved thresholds if the player was already hydrated
    /// in this process, without triggering hydration.
    #[must_use]
    pub fn achieved_if_hydrated(&self, player: PlayerId) -> Option<Vec<u64>> {
        let slot = self.achieved.read().get(&player).map(Arc::clone)?;
        let set = slot.get()?;
        let out = set.lock().iter().copied().collect();
        Some(out)
    }

    /// The player's achieved thresholds as they would be persisted now,
    /// without triggering hydration: the hydrated set, else the preloaded
    /// one. `None` if neither is available and only the repository knows.
    #[must_use]
    pub fn known_achieved(&self, player: PlayerId) -> Option<Vec<u64>> {
        self.achieved_if_hydrated(player)
            .or_else(|| self.preloaded_set(player))
    }

    /// Returns true if the player's set has been hydrated.
    #[must_use]
    pub fn is_hydrated(&self, player: PlayerId) -> bool {
        self.achieved
            .read()
            .get(&player)
            .is_some_and(|slot| slot.get().is_some())
    }
}

impl std::fmt::Debug for MilestoneTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MilestoneTracker")
            .field("thresholds", &self.thresholds)
            .field("players", &self.achieved.read().len())
            .field("persisted", &self.source.is_some())
            .field("preloaded", &self.is_preloaded())
            .finish()
    }
}
