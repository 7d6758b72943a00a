//! # Configuration
//!
//! Every section is optional; a partial or empty file yields the defaults.
//!
//! ```toml
//! max_blocks = 64
//! disabled_zones = ["world_nether"]
//! durability_multiplier = 1.0
//!
//! [auto_pickup]
//! enabled = true
//! full_inventory_action = "drop"
//!
//! [milestones]
//! thresholds = [100, 500, 1000, 5000, 10000]
//! commands = { "1000" = ["give {player} diamond 1"] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use veinminer_core::{BlockKind, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_BLOCKS};
use veinminer_stats::{RewardSettings, StatsSettings, DEFAULT_THRESHOLDS};

use crate::error::{ConfigError, ConfigResult};

/// Kinds vein-mineable out of the box.
pub const DEFAULT_VEIN_BLOCKS: [&str; 39] = [
    // Ores
    "minecraft:coal_ore",
    "minecraft:iron_ore",
    "minecraft:gold_ore",
    "minecraft:diamond_ore",
    "minecraft:emerald_ore",
    "minecraft:lapis_ore",
    "minecraft:redstone_ore",
    "minecraft:lit_redstone_ore",
    "minecraft:copper_ore",
    "minecraft:deepslate_coal_ore",
    "minecraft:deepslate_iron_ore",
    "minecraft:deepslate_gold_ore",
    "minecraft:deepslate_diamond_ore",
    "minecraft:deepslate_emerald_ore",
    "minecraft:deepslate_lapis_ore",
    "minecraft:deepslate_redstone_ore",
    "minecraft:lit_deepslate_redstone_ore",
    "minecraft:deepslate_copper_ore",
    "minecraft:quartz_ore",
    "minecraft:nether_gold_ore",
    "minecraft:ancient_debris",
    // Logs
    "minecraft:oak_log",
    "minecraft:spruce_log",
    "minecraft:birch_log",
    "minecraft:jungle_log",
    "minecraft:acacia_log",
    "minecraft:dark_oak_log",
    "minecraft:mangrove_log",
    "minecraft:cherry_log",
    "minecraft:crimson_stem",
    "minecraft:warped_stem",
    // Leaves
    "minecraft:oak_leaves",
    "minecraft:spruce_leaves",
    "minecraft:birch_leaves",
    "minecraft:jungle_leaves",
    "minecraft:acacia_leaves",
    "minecraft:dark_oak_leaves",
    "minecraft:mangrove_leaves",
    "minecraft:cherry_leaves",
];

/// What happens to drops that do not fit the inventory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FullInventoryAction {
    /// Drop them at the block.
    #[default]
    Drop,
    /// Discard them.
    Delete,
}

impl FullInventoryAction {
    /// Past tense used in the inventory-full message.
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Drop => "dropped",
            Self::Delete => "deleted",
        }
    }
}

/// `[auto_pickup]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPickupConfig {
    /// Put drops straight into the inventory.
    pub enabled: bool,
    /// Policy when the inventory is full.
    pub full_inventory_action: FullInventoryAction,
}

impl Default for AutoPickupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            full_inventory_action: FullInventoryAction::Drop,
        }
    }
}

/// `[effects]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Break particles per block.
    pub particles: bool,
    /// Completion sound. The tool-break sound always plays.
    pub sounds: bool,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            particles: true,
            sounds: true,
        }
    }
}

/// `[logging]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch.
    pub enabled: bool,
    /// One line per vein mined.
    pub log_vein_mining: bool,
    /// Summary when the config is loaded.
    pub log_config_loading: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_vein_mining: true,
            log_config_loading: true,
        }
    }
}

impl LoggingConfig {
    /// Log vein-mining activity.
    #[must_use]
    pub const fn vein_mining(&self) -> bool {
        self.enabled && self.log_vein_mining
    }

    /// Log config loading.
    #[must_use]
    pub const fn config_loading(&self) -> bool {
        self.enabled && self.log_config_loading
    }
}

/// `[statistics]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Record statistics.
    pub enabled: bool,
    /// Persist them to `file`.
    pub save_to_file: bool,
    /// Stats document, relative to the host's data directory.
    pub file: PathBuf,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            save_to_file: true,
            file: PathBuf::from("stats.toml"),
        }
    }
}

/// `[milestones]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestonesConfig {
    /// Cumulative block thresholds.
    pub thresholds: Vec<u64>,
    /// Chat message on reaching a threshold.
    pub message: String,
    /// Console commands per threshold. Keys are thresholds.
    pub commands: BTreeMap<String, Vec<String>>,
}

impl Default for MilestonesConfig {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            message: RewardSettings::default().message,
            commands: BTreeMap::new(),
        }
    }
}

/// `[messages]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Sent once per harvest that could not place every item.
    /// `{count}` and `{action}` are substituted. Empty disables it.
    pub inventory_full: String,
    /// Tip shown on a claimed harvest. `{count}` is substituted.
    pub vein_tip: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            inventory_full: "&eInventory full! {count} items were {action}.".to_string(),
            vein_tip: "&6Vein Mining: &f{count} blocks".to_string(),
        }
    }
}

/// `[cache]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Ceiling of the tool eligibility cache.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Complete configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VeinMinerConfig {
    /// Largest vein broken at once.
    pub max_blocks: usize,
    /// Kinds eligible for vein mining.
    pub vein_blocks: Vec<BlockKind>,
    /// Zones (worlds) where vein mining is off.
    pub disabled_zones: Vec<String>,
    /// Durability cost per block, rounded to a whole number of at least 1.
    pub durability_multiplier: f64,
    /// `[auto_pickup]`
    pub auto_pickup: AutoPickupConfig,
    /// `[effects]`
    pub effects: EffectsConfig,
    /// `[logging]`
    pub logging: LoggingConfig,
    /// `[statistics]`
    pub statistics: StatisticsConfig,
    /// `[milestones]`
    pub milestones: MilestonesConfig,
    /// `[messages]`
    pub messages: MessagesConfig,
    /// `[cache]`
    pub cache: CacheConfig,
}

impl Default for VeinMinerConfig {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
            vein_blocks: DEFAULT_VEIN_BLOCKS.iter().map(BlockKind::new).collect(),
            disabled_zones: Vec::new(),
            durability_multiplier: 1.0,
            auto_pickup: AutoPickupConfig::default(),
            effects: EffectsConfig::default(),
            logging: LoggingConfig::default(),
            statistics: StatisticsConfig::default(),
            milestones: MilestonesConfig::default(),
            messages: MessagesConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl VeinMinerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let mut config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if config.logging.config_loading() {
            config.log_summary();
        }
        Ok(config)
    }

    /// Renders the config as TOML, e.g. to write out the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a value cannot be represented.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Checks ranges and normalizes the durability multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_blocks` is zero or a
    /// milestone command key is not a threshold.
    pub fn validate(&mut self) -> ConfigResult<()> {
        if self.max_blocks == 0 {
            return Err(ConfigError::Invalid("max_blocks must be at least 1".to_string()));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid("cache.max_entries must be at least 1".to_string()));
        }
        for key in self.milestones.commands.keys() {
            if key.trim().parse::<u64>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "milestones.commands key {key:?} is not a block count"
                )));
            }
        }

        if !self.durability_multiplier.is_finite() {
            self.durability_multiplier = 1.0;
        }
        self.durability_multiplier = self.durability_multiplier.max(0.0);
        Ok(())
    }

    /// Durability points taken per block: the multiplier rounded, never
    /// less than 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn durability_cost(&self) -> u32 {
        let rounded = self.durability_multiplier.round();
        if rounded.is_finite() && rounded >= 1.0 {
            rounded.min(f64::from(u32::MAX)) as u32
        } else {
            1
        }
    }

    /// Returns true if vein mining is off in `zone`.
    #[must_use]
    pub fn is_zone_disabled(&self, zone: &str) -> bool {
        self.disabled_zones.iter().any(|z| z == zone)
    }

    /// Statistics settings derived from this config.
    #[must_use]
    pub fn stats_settings(&self) -> StatsSettings {
        let commands = self
            .milestones
            .commands
            .iter()
            .filter_map(|(key, commands)| Some((key.trim().parse::<u64>().ok()?, commands.clone())))
            .collect();

        StatsSettings {
            enabled: self.statistics.enabled,
            persist: self.statistics.save_to_file,
            thresholds: self.milestones.thresholds.clone(),
            rewards: RewardSettings {
                message: self.milestones.message.clone(),
                commands,
            },
        }
    }

    fn log_summary(&self) {
        tracing::info!(
            max_blocks = self.max_blocks,
            vein_blocks = self.vein_blocks.len(),
            auto_pickup = self.auto_pickup.enabled,
            full_inventory_action = self.auto_pickup.full_inventory_action.past_tense(),
            disabled_zones = self.disabled_zones.len(),
            effects = self.effects.particles || self.effects.sounds,
            "loaded vein miner config"
        );
    }
}
