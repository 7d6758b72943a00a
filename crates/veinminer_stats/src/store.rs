//! # Statistics Store
//!
//! Concurrent map of player identity to [`PlayerStats`], owning the
//! [`MilestoneTracker`], the reward queue and the save worker.
//!
//! ## Flow
//!
//! ```text
//!   record_vein_mine ──> PlayerStats::record ──> MilestoneTracker::check_and_grant
//!                                                          │
//!                                                          └──> RewardQueue
//!   save(mode) ──> InFlightGuard ──> shallow copy of map ──> inline write | SaveWorker
//! ```
//!
//! Recording and querying are synchronous and safe from any thread. A save
//! may or may not include a record that completes in the same instant, but
//! never a torn one.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{StatsError, StatsResult};
use crate::milestones::{MilestoneGrant, MilestoneTracker, DEFAULT_THRESHOLDS};
use crate::player::{now_millis, PlayerId, PlayerStats, StatsSnapshot};
use crate::repository::{RejectedEntry, StatsRepository};
use crate::rewards::{DeliveryReport, RewardQueue, RewardSettings, RewardSink};
use crate::writer::{write_snapshot, InFlightGuard, PlayerSnapshot, SaveJob, SaveWorker};

/// Settings of the statistics subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsSettings {
    /// Record statistics at all.
    pub enabled: bool,
    /// Persist statistics through the repository.
    pub persist: bool,
    /// Milestone thresholds; empty selects the defaults.
    pub thresholds: Vec<u64>,
    /// What a milestone grant does.
    pub rewards: RewardSettings,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            persist: true,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            rewards: RewardSettings::default(),
        }
    }
}

impl StatsSettings {
    /// Returns true if statistics are both recorded and persisted.
    #[must_use]
    pub const fn persists(&self) -> bool {
        self.enabled && self.persist
    }
}

/// How a save is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMode {
    /// Write on the calling thread. Required on shutdown paths.
    Blocking,
    /// Hand the write to the writer thread and return immediately.
    Background,
}

/// What a save call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persistence is switched off.
    Disabled,
    /// Another save was running; nothing was queued.
    AlreadyInFlight,
    /// Written inline.
    Written {
        /// Records in the document.
        players: usize,
    },
    /// Handed to the writer thread.
    Queued {
        /// Players in the snapshot.
        players: usize,
    },
}

/// Result of loading the persisted document.
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    /// Players restored.
    pub loaded: usize,
    /// Entries skipped as corrupt.
    pub rejected: Vec<RejectedEntry>,
}

/// Concurrent per-player statistics with milestones and persistence.
pub struct StatisticsStore {
    settings: StatsSettings,
    players: RwLock<HashMap<PlayerId, Arc<PlayerStats>>>,
    milestones: Arc<MilestoneTracker>,
    repository: Arc<dyn StatsRepository>,
    in_flight: Arc<AtomicBool>,
    worker: Mutex<Option<SaveWorker>>,
    rewards: RewardQueue,
}

impl StatisticsStore {
    /// Creates a store. The writer thread is only started when the
    /// settings persist statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::WorkerSpawn`] if the writer thread cannot be
    /// started.
    pub fn new(settings: StatsSettings, repository: Arc<dyn StatsRepository>) -> StatsResult<Self> {
        let source = settings.persists().then(|| Arc::clone(&repository));
        let milestones = Arc::new(MilestoneTracker::new(&settings.thresholds, source));

        let worker = if settings.persists() {
            Some(SaveWorker::spawn(Arc::clone(&milestones), Arc::clone(&repository))?)
        } else {
            None
        };

        Ok(Self {
            settings,
            players: RwLock::new(HashMap::new()),
            milestones,
            repository,
            in_flight: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(worker),
            rewards: RewardQueue::new(),
        })
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &StatsSettings {
        &self.settings
    }

    /// The milestone tracker.
    #[must_use]
    pub fn milestones(&self) -> &MilestoneTracker {
        &self.milestones
    }

    /// Returns the player's stats, inserting a zeroed record if absent.
    ///
    /// Two simultaneous first-time callers observe the same record.
    fn stats_for(&self, player: PlayerId, name: &str) -> Arc<PlayerStats> {
        if let Some(stats) = self.players.read().get(&player) {
            return Arc::clone(stats);
        }
        let mut players = self.players.write();
        Arc::clone(
            players
                .entry(player)
                .or_insert_with(|| Arc::new(PlayerStats::new(name))),
        )
    }

    /// Records one vein of `blocks` blocks mined by `player`.
    ///
    /// Returns the milestone thresholds granted by this record; each is
    /// also queued for reward delivery. A no-op when statistics are
    /// disabled. A vein of 0 blocks still counts as a vein.
    pub fn record_vein_mine(&self, player: PlayerId, name: &str, blocks: u64) -> Vec<u64> {
        if !self.settings.enabled {
            return Vec::new();
        }

        let delta = self.stats_for(player, name).record(blocks, now_millis());
        let granted = self
            .milestones
            .check_and_grant(player, delta.previous_total, delta.new_total);

        for &threshold in &granted {
            tracing::info!(player = %name, threshold, total = delta.new_total, "milestone reached");
            self.rewards.push(MilestoneGrant {
                player,
                player_name: name.to_string(),
                threshold,
                total_blocks: delta.new_total,
            });
        }

        granted
    }

    /// The player's statistics; zeroed if the player never vein-mined.
    #[must_use]
    pub fn get_stats(&self, player: PlayerId, name: &str) -> StatsSnapshot {
        self.players
            .read()
            .get(&player)
            .map_or_else(|| StatsSnapshot::empty(name), |stats| stats.snapshot())
    }

    /// Number of players with statistics in memory.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.read().len()
    }

    /// Grants waiting for delivery.
    #[must_use]
    pub fn pending_rewards(&self) -> usize {
        self.rewards.len()
    }

    /// Drops queued rewards of a player who left. Returns how many.
    pub fn discard_rewards_for(&self, player: PlayerId) -> usize {
        self.rewards.discard_for(player)
    }

    /// Delivers queued milestone rewards. Call from the host's main thread.
    pub fn deliver_pending_rewards(&self, sink: &mut dyn RewardSink) -> DeliveryReport {
        self.rewards.deliver_pending(&self.settings.rewards, sink)
    }

    /// Returns true while a save is running.
    #[must_use]
    pub fn save_in_flight(&self) -> bool {
        self.in_flight.load(std::sync::atomic::Ordering::Acquire)
    }

    fn snapshot_players(&self) -> PlayerSnapshot {
        self.players
            .read()
            .iter()
            .map(|(id, stats)| (*id, Arc::clone(stats)))
            .collect()
    }

    /// Persists every player's statistics and milestones.
    ///
    /// At most one save runs at a time; a call made while another is in
    /// flight returns [`SaveOutcome::AlreadyInFlight`] without queuing.
    ///
    /// # Errors
    ///
    /// Returns an error if a blocking write fails or the writer thread is
    /// gone. In-memory statistics are untouched and the next save retries.
    pub fn save(&self, mode: SaveMode) -> StatsResult<SaveOutcome> {
        if !self.settings.persists() {
            return Ok(SaveOutcome::Disabled);
        }
        let Some(guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            tracing::debug!("stats save already in flight, skipping");
            return Ok(SaveOutcome::AlreadyInFlight);
        };

        let players = self.snapshot_players();

        match mode {
            SaveMode::Blocking => {
                let result = write_snapshot(&players, &self.milestones, self.repository.as_ref());
                drop(guard);
                let written = result.map_err(|e| {
                    tracing::error!(error = %e, "stats save failed");
                    e
                })?;
                Ok(SaveOutcome::Written { players: written })
            }
            SaveMode::Background => {
                let count = players.len();
                match self.worker.lock().as_ref() {
                    Some(worker) => worker.submit(SaveJob { players, guard })?,
                    None => return Err(StatsError::WorkerStopped),
                }
                Ok(SaveOutcome::Queued { players: count })
            }
        }
    }

    /// Restores statistics from the repository. Called once at startup.
    ///
    /// Corrupt entries are logged and skipped; every other player is
    /// restored. Restored entries replace any in-memory record, and their
    /// milestones are handed to the tracker so first harvests never read
    /// the repository again.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document as a whole cannot be read.
    pub fn load(&self) -> StatsResult<LoadReport> {
        if !self.settings.persists() {
            return Ok(LoadReport::default());
        }

        let doc = self.repository.load_all()?;
        for rejected in &doc.rejected {
            tracing::warn!(key = %rejected.key, reason = %rejected.reason, "skipping corrupt stats entry");
        }

        let loaded = doc.records.len();
        {
            let mut players = self.players.write();
            for (id, record) in &doc.records {
                players.insert(*id, Arc::new(PlayerStats::from_snapshot(&record.stats())));
            }
        }
        self.milestones.preload(
            doc.records
                .iter()
                .map(|(id, record)| (*id, record.milestones.clone()))
                .collect(),
        );

        tracing::info!(players = loaded, rejected = doc.rejected.len(), "loaded vein mining stats");
        Ok(LoadReport {
            loaded,
            rejected: doc.rejected,
        })
    }

    /// Stops the writer thread, then saves synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub fn shutdown(&self) -> StatsResult<SaveOutcome> {
        if let Some(mut worker) = self.worker.lock().take() {
            worker.shutdown();
        }
        self.save(SaveMode::Blocking)
    }
}

impl std::fmt::Debug for StatisticsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsStore")
            .field("settings", &self.settings)
            .field("players", &self.player_count())
            .field("milestones", &self.milestones)
            .field("pending_rewards", &self.rewards.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use uuid::Uuid;

    fn store_with(settings: StatsSettings) -> (StatisticsStore, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        let source: Arc<dyn StatsRepository> = repo.clone();
        (StatisticsStore::new(settings, source).unwrap(), repo)
    }

    #[test]
    fn test_record_and_get() {
        let (store, _) = store_with(StatsSettings::default());
        let steve = Uuid::from_u128(1);

        store.record_vein_mine(steve, "Steve", 10);
        store.record_vein_mine(steve, "Steve", 30);

        let stats = store.get_stats(steve, "Steve");
        assert_eq!(stats.total_veins, 2);
        assert_eq!(stats.total_blocks, 40);
        assert_eq!(stats.largest_vein, 30);
        assert!(stats.last_mined_at > 0);
    }

    #[test]
    fn test_unknown_player_gets_zeroed_stats() {
        let (store, _) = store_with(StatsSettings::default());
        let stats = store.get_stats(Uuid::from_u128(99), "Nobody");
        assert_eq!(stats, StatsSnapshot::empty("Nobody"));
        assert_eq!(store.player_count(), 0);
    }

    #[test]
    fn test_disabled_store_records_nothing() {
        let (store, repo) = store_with(StatsSettings {
            enabled: false,
            ..StatsSettings::default()
        });
        let steve = Uuid::from_u128(1);

        assert!(store.record_vein_mine(steve, "Steve", 500).is_empty());
        assert!(store.get_stats(steve, "Steve").is_empty());
        assert_eq!(store.save(SaveMode::Blocking).unwrap(), SaveOutcome::Disabled);
        assert_eq!(repo.write_count(), 0);
    }

    #[test]
    fn test_zero_block_vein_still_counts() {
        let (store, _) = store_with(StatsSettings::default());
        let steve = Uuid::from_u128(1);

        assert!(store.record_vein_mine(steve, "Steve", 0).is_empty());

        let stats = store.get_stats(steve, "Steve");
        assert_eq!(stats.total_veins, 1);
        assert_eq!(stats.total_blocks, 0);
        assert_eq!(stats.largest_vein, 0);
        assert!(stats.last_mined_at > 0);
    }

    #[test]
    fn test_first_records_after_load_do_not_reread_repository() {
        use crate::repository::PersistedRecord;
        use std::collections::BTreeMap;

        let records: BTreeMap<_, _> = (0..50u128)
            .map(|i| {
                let record = PersistedRecord {
                    name: format!("player_{i}"),
                    total_veins: 1,
                    total_blocks: 90,
                    largest_vein: 90,
                    milestones: vec![50],
                    ..PersistedRecord::default()
                };
                (Uuid::from_u128(i), record)
            })
            .collect();
        let repo = Arc::new(MemoryRepository::with_records(records));
        let source: Arc<dyn StatsRepository> = repo.clone();
        let store = StatisticsStore::new(
            StatsSettings {
                thresholds: vec![50, 100],
                ..StatsSettings::default()
            },
            source,
        )
        .unwrap();

        assert_eq!(store.load().unwrap().loaded, 50);
        assert_eq!(repo.read_count(), 1);

        for i in 0..50u128 {
            let granted = store.record_vein_mine(Uuid::from_u128(i), &format!("player_{i}"), 20);
            assert_eq!(granted, vec![100]);
        }
        // A player missing from the document starts empty, also without a read
        assert_eq!(store.record_vein_mine(Uuid::from_u128(500), "Newcomer", 60), vec![50]);

        assert_eq!(repo.read_count(), 1);
    }

    #[test]
    fn test_milestone_queued_for_delivery() {
        let (store, _) = store_with(StatsSettings {
            thresholds: vec![100],
            ..StatsSettings::default()
        });
        let steve = Uuid::from_u128(1);

        assert!(store.record_vein_mine(steve, "Steve", 50).is_empty());
        assert_eq!(store.record_vein_mine(steve, "Steve", 100), vec![100]);
        assert!(store.record_vein_mine(steve, "Steve", 150).is_empty());
        assert_eq!(store.pending_rewards(), 1);
    }

    #[test]
    fn test_blocking_save_writes_document() {
        let (store, repo) = store_with(StatsSettings::default());
        store.record_vein_mine(Uuid::from_u128(1), "Steve", 120);
        store.record_vein_mine(Uuid::from_u128(2), "Alex", 3);

        assert_eq!(
            store.save(SaveMode::Blocking).unwrap(),
            SaveOutcome::Written { players: 2 }
        );
        let records = repo.records();
        assert_eq!(records[&Uuid::from_u128(1)].milestones, vec![100]);
        assert_eq!(records[&Uuid::from_u128(2)].total_blocks, 3);
        assert!(!store.save_in_flight());
    }

    #[test]
    fn test_shutdown_saves_synchronously() {
        let (store, repo) = store_with(StatsSettings::default());
        store.record_vein_mine(Uuid::from_u128(1), "Steve", 8);

        assert_eq!(store.shutdown().unwrap(), SaveOutcome::Written { players: 1 });
        assert_eq!(repo.write_count(), 1);

        // The worker is gone; background saves now fail cleanly
        assert!(matches!(
            store.save(SaveMode::Background),
            Err(StatsError::WorkerStopped)
        ));
        assert!(!store.save_in_flight());
    }
}
