//! # VeinMiner
//!
//! The facade a host drives: one value owning the harvest coordinator, the
//! toggle registry and the statistics store.
//!
//! ## Lifecycle
//!
//! ```text
//!   enable ──> load stats ──> { on_block_break | on_player_quit | reload | save
//!                               | deliver_pending_rewards }* ──> shutdown
//! ```
//!
//! `shutdown` always saves synchronously; no background thread is assumed
//! to outlive it.
//!
//! Milestone rewards wait in an unbounded queue until the host calls
//! `deliver_pending_rewards`, so the host must call it from its tick. Rewards
//! of a player who quits are dropped by `on_player_quit`.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use veinminer_core::Coordinate;
use veinminer_stats::{
    now_millis, DeliveryReport, PlayerId, RewardSink, SaveMode, SaveOutcome, StatisticsStore, StatsRepository,
    StatsSnapshot, TomlFileRepository,
};

use crate::config::VeinMinerConfig;
use crate::display::format_stats;
use crate::error::{ConfigResult, VeinMinerResult};
use crate::harvest::{HarvestOutcome, VeinHarvestCoordinator};
use crate::host::{HostWorld, Miner, STATS_PERMISSION};
use crate::toggles::ToggleRegistry;

/// Vein mining for one server.
#[derive(Debug)]
pub struct VeinMiner {
    coordinator: RwLock<VeinHarvestCoordinator>,
    toggles: ToggleRegistry,
    stats: StatisticsStore,
}

impl VeinMiner {
    /// Starts vein mining with statistics kept in `repository`, restoring
    /// persisted statistics.
    ///
    /// A stats document that cannot be read is logged and the server starts
    /// with empty statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics writer cannot be started.
    pub fn enable(config: VeinMinerConfig, repository: Arc<dyn StatsRepository>) -> VeinMinerResult<Self> {
        let stats = StatisticsStore::new(config.stats_settings(), repository)?;
        match stats.load() {
            Ok(report) if !report.rejected.is_empty() => {
                tracing::warn!(rejected = report.rejected.len(), "some stats entries could not be restored");
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "failed to load stats, starting empty"),
        }

        tracing::info!(
            max_blocks = config.max_blocks,
            vein_blocks = config.vein_blocks.len(),
            "vein miner enabled"
        );

        Ok(Self {
            coordinator: RwLock::new(VeinHarvestCoordinator::new(config)),
            toggles: ToggleRegistry::new(),
            stats,
        })
    }

    /// Starts vein mining with the config and stats document found in
    /// `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the statistics writer
    /// cannot be started.
    pub fn enable_in(data_dir: impl AsRef<Path>) -> VeinMinerResult<Self> {
        let data_dir = data_dir.as_ref();
        let config = VeinMinerConfig::load(data_dir.join("config.toml"))?;
        let repository = Arc::new(TomlFileRepository::new(data_dir.join(&config.statistics.file)));
        Self::enable(config, repository)
    }

    /// Handles a block break reported by the host.
    ///
    /// If the outcome is claimed the host must cancel its own handling of
    /// the break.
    pub fn on_block_break<W, M>(&self, world: &mut W, miner: &mut M, at: Coordinate) -> HarvestOutcome
    where
        W: HostWorld + ?Sized,
        M: Miner + ?Sized,
    {
        self.coordinator
            .read()
            .harvest(world, miner, at, &self.toggles, &self.stats)
    }

    /// Drops per-player state of a player who left, including rewards
    /// still waiting for delivery.
    pub fn on_player_quit(&self, player: PlayerId) {
        self.toggles.forget(player);
        let dropped = self.stats.discard_rewards_for(player);
        if dropped > 0 {
            tracing::debug!(%player, rewards = dropped, "dropped rewards of departed player");
        }
    }

    /// Applies a new configuration and clears the eligibility cache.
    ///
    /// Statistics settings take effect on the next enable.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid; the running config is kept.
    pub fn reload(&self, mut config: VeinMinerConfig) -> ConfigResult<()> {
        config.validate()?;
        self.coordinator.write().reconfigure(config);
        tracing::info!("vein miner config reloaded");
        Ok(())
    }

    /// Per-player toggles.
    #[must_use]
    pub fn toggles(&self) -> &ToggleRegistry {
        &self.toggles
    }

    /// The statistics store.
    #[must_use]
    pub fn stats(&self) -> &StatisticsStore {
        &self.stats
    }

    /// A copy of the running configuration.
    #[must_use]
    pub fn config(&self) -> VeinMinerConfig {
        self.coordinator.read().config().clone()
    }

    /// The player's statistics.
    #[must_use]
    pub fn player_stats(&self, player: PlayerId, name: &str) -> StatsSnapshot {
        self.stats.get_stats(player, name)
    }

    /// The miner's statistics report, with `&` colour codes, or `None` if
    /// the miner lacks [`STATS_PERMISSION`].
    #[must_use]
    pub fn stats_report<M: Miner + ?Sized>(&self, miner: &M) -> Option<String> {
        if !miner.has_permission(STATS_PERMISSION) {
            return None;
        }
        Some(format_stats(
            &self.stats.get_stats(miner.id(), miner.name()),
            now_millis(),
        ))
    }

    /// Delivers queued milestone rewards. Call from the host's main thread.
    pub fn deliver_pending_rewards(&self, sink: &mut dyn RewardSink) -> DeliveryReport {
        self.stats.deliver_pending_rewards(sink)
    }

    /// Periodic save on the writer thread; never blocks on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer thread is gone.
    pub fn save(&self) -> VeinMinerResult<SaveOutcome> {
        Ok(self.stats.save(SaveMode::Background)?)
    }

    /// Stops the writer thread and saves synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the final save fails.
    pub fn shutdown(&self) -> VeinMinerResult<SaveOutcome> {
        let outcome = self.stats.shutdown()?;
        tracing::info!("vein miner disabled");
        Ok(outcome)
    }
}
