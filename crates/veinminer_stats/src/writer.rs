//! # Stats Writer
//!
//! Persists statistics snapshots off the caller's thread.
//!
//! ## Architecture
//!
//! ```text
//!   save(Background) ──try_acquire──> [slot: bounded(1)] ──> writer thread ──> repository
//!         │                                                       │
//!         └── AlreadyInFlight if the guard is held                └── guard released on drop
//! ```
//!
//! At most one save is in flight at any time. The in-flight guard travels
//! with the job and is released when the job is dropped, whether the write
//! succeeded, failed, or panicked, so one bad write never wedges later saves.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError};

use crate::error::{StatsError, StatsResult};
use crate::milestones::MilestoneTracker;
use crate::player::{PlayerId, PlayerStats};
use crate::repository::{PersistedRecord, StatsRepository};

/// Name of the writer thread.
pub const WRITER_THREAD_NAME: &str = "veinminer-stats-writer";

/// Exclusive right to run a save. Released on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    /// Takes the in-flight flag, or returns `None` if a save already holds it.
    #[must_use]
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Shallow copy of the player map at the moment a save was requested.
pub type PlayerSnapshot = Vec<(PlayerId, Arc<PlayerStats>)>;

/// One save handed to the writer thread.
#[derive(Debug)]
pub struct SaveJob {
    /// Players to write.
    pub players: PlayerSnapshot,
    /// Held until the job is finished.
    pub guard: InFlightGuard,
}

/// Builds the full document for `players` and writes it.
///
/// Players whose milestones were neither hydrated nor preloaded in this
/// process keep the milestones already persisted for them. Returns the number of records
/// written.
///
/// # Errors
///
/// Returns an error if the existing document must be consulted and cannot
/// be read, or if the write fails.
pub fn write_snapshot(
    players: &[(PlayerId, Arc<PlayerStats>)],
    milestones: &MilestoneTracker,
    repository: &dyn StatsRepository,
) -> StatsResult<usize> {
    let mut records = BTreeMap::new();
    let mut unhydrated = Vec::new();

    for (id, stats) in players {
        let snapshot = stats.snapshot();
        match milestones.known_achieved(*id) {
            Some(achieved) => {
                records.insert(*id, PersistedRecord::new(&snapshot, achieved));
            }
            None => unhydrated.push((*id, snapshot)),
        }
    }

    if !unhydrated.is_empty() {
        let mut on_disk = repository.load_all()?.records;
        for (id, snapshot) in unhydrated {
            let achieved = on_disk
                .remove(&id)
                .map(|record| record.milestones)
                .unwrap_or_default();
            records.insert(id, PersistedRecord::new(&snapshot, achieved));
        }
    }

    repository.write_all(&records)?;
    Ok(records.len())
}

/// Counters of the writer thread.
#[derive(Debug, Default)]
pub struct WriterStats {
    /// Saves that completed.
    pub completed: AtomicU64,
    /// Saves that failed.
    pub failed: AtomicU64,
}

/// Background writer thread fed through a single-slot channel.
#[derive(Debug)]
pub struct SaveWorker {
    tx: Option<Sender<SaveJob>>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<WriterStats>,
}

impl SaveWorker {
    /// Starts the writer thread.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::WorkerSpawn`] if the thread cannot be created.
    pub fn spawn(milestones: Arc<MilestoneTracker>, repository: Arc<dyn StatsRepository>) -> StatsResult<Self> {
        let (tx, rx) = crossbeam_channel::bounded::<SaveJob>(1);
        let stats = Arc::new(WriterStats::default());
        let writer_stats = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || {
                for job in rx {
                    match write_snapshot(&job.players, &milestones, repository.as_ref()) {
                        Ok(written) => {
                            writer_stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(players = written, "stats saved");
                        }
                        Err(e) => {
                            writer_stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(error = %e, "background stats save failed");
                        }
                    }
                    // job (and its guard) dropped here
                }
            })
            .map_err(StatsError::WorkerSpawn)?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            stats,
        })
    }

    /// Hands a job to the writer thread without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::WorkerStopped`] if the thread is gone. The
    /// job's guard is released either way.
    pub fn submit(&self, job: SaveJob) -> StatsResult<()> {
        let Some(tx) = &self.tx else {
            return Err(StatsError::WorkerStopped);
        };
        match tx.try_send(job) {
            Ok(()) => Ok(()),
            // Every queued job holds the guard, so a full slot means a save
            // is already pending; dropping this job releases its guard.
            Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(StatsError::WorkerStopped),
        }
    }

    /// Saves completed by the thread.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.stats.completed.load(Ordering::Relaxed)
    }

    /// Saves that failed on the thread.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }

    /// Closes the slot and waits for the thread to finish any running job.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("stats writer thread panicked");
            }
        }
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
