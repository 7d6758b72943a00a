//! # VeinMiner
//!
//! Sneak while breaking an ore, log or leaf block and the whole connected
//! vein comes down with it, as one action.
//!
//! ## Design Principles
//!
//! 1. **The host owns the world** - every world, inventory and chat effect
//!    goes through [`HostWorld`] and [`Miner`], on the thread that reported
//!    the break
//! 2. **Skip, never fail** - an unmet precondition leaves the break to the
//!    host, and a failing block is skipped without aborting the vein
//! 3. **Credit what was mined** - statistics record the blocks actually
//!    broken, once per harvest
//!
//! ## Example
//!
//! ```rust,ignore
//! use veinminer::VeinMiner;
//!
//! let miner = VeinMiner::enable_in("plugins/VeinMiner")?;
//!
//! // From the host's block-break event:
//! if miner.on_block_break(&mut world, &mut player, at).is_claimed() {
//!     event.cancel();
//! }
//!
//! // From the host's tick:
//! miner.deliver_pending_rewards(&mut server);
//!
//! // On disable:
//! miner.shutdown()?;
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod display;
pub mod error;
pub mod harvest;
pub mod host;
pub mod plugin;
pub mod toggles;

pub use config::{FullInventoryAction, VeinMinerConfig, DEFAULT_VEIN_BLOCKS};
pub use display::{format_last_mined, format_stats};
pub use error::{ConfigError, ConfigResult, HarvestError, VeinMinerError, VeinMinerResult};
pub use harvest::{HarvestOutcome, HarvestReport, SkipReason, VeinHarvestCoordinator};
pub use host::{BlockDrops, HarvestSound, HostWorld, ItemStack, Miner, ToolItem, STATS_PERMISSION, USE_PERMISSION};
pub use plugin::VeinMiner;
pub use toggles::ToggleRegistry;

pub use veinminer_core::{BlockKind, Coordinate, ToolKind};
pub use veinminer_stats::{PlayerId, RewardSink, SaveOutcome, StatsSnapshot};
