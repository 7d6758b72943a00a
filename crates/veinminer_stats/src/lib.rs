//! # VeinMiner Stats
//!
//! Lifetime vein-mining statistics, one-time milestones and their
//! persistence.
//!
//! ## Design Principles
//!
//! 1. **Never torn** - counters are individually atomic and a snapshot never
//!    observes half of a record
//! 2. **Exactly once** - a milestone is granted at most once per player
//!    lifetime, across restarts, even under concurrent harvests
//! 3. **Never wedged** - at most one save runs at a time and a failed save
//!    only costs that flush
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use veinminer_stats::{MemoryRepository, SaveMode, StatisticsStore, StatsSettings};
//!
//! let store = StatisticsStore::new(StatsSettings::default(), Arc::new(MemoryRepository::new()))?;
//! let granted = store.record_vein_mine(player, "Steve", 120);
//! assert_eq!(granted, vec![100]);
//! store.save(SaveMode::Background)?;
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod milestones;
pub mod player;
pub mod repository;
pub mod rewards;
pub mod store;
pub mod writer;

pub use error::{StatsError, StatsResult};
pub use milestones::{MilestoneGrant, MilestoneTracker, DEFAULT_THRESHOLDS};
pub use player::{now_millis, PlayerId, PlayerStats, RecordDelta, StatsSnapshot};
pub use repository::{
    decode_document, encode_document, LoadedDocument, MemoryRepository, PersistedRecord, RejectedEntry,
    StatsRepository, TomlFileRepository,
};
pub use rewards::{render, DeliveryReport, RewardQueue, RewardSettings, RewardSink};
pub use store::{LoadReport, SaveMode, SaveOutcome, StatisticsStore, StatsSettings};
pub use writer::{InFlightGuard, SaveWorker};
