//! # Vein Harvest Coordinator
//!
//! Turns one qualifying block break into a whole-vein harvest.
//!
//! ## Flow
//!
//! ```text
//!   break(seed) ──> preconditions ──fail──> Skipped (host breaks one block)
//!                        │ ok
//!                        ▼
//!                  find_vein(seed) ──size <= 1──> Skipped
//!                        │
//!                        ▼ claimed
//!   for each block, until the tool has paid for all it can afford:
//!     kind still matches? ─> drops/xp ─> clear ─> items ─> particle ─> durability
//!                        │
//!                        ▼
//!   xp orb, inventory-full message, tool write-back, sound, record stats once
//! ```
//!
//! A failure on one block is logged and that block is skipped without
//! credit; the rest of the vein is still mined.

use std::collections::HashSet;

use veinminer_core::{find_vein, BlockKind, Coordinate, ToolEligibilityCache, ToolKind};
use veinminer_stats::StatisticsStore;

use crate::config::{FullInventoryAction, VeinMinerConfig};
use crate::error::{BlockResult, HarvestError};
use crate::host::{HarvestSound, HostWorld, ItemStack, Miner, ToolItem, USE_PERMISSION};
use crate::toggles::ToggleRegistry;

/// Why a break was left to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Player lacks the use permission.
    NoPermission,
    /// Player switched vein mining off.
    ToggledOff,
    /// Player is in a disabled zone.
    DisabledZone,
    /// Player is not crouching.
    NotSneaking,
    /// The block is not a vein kind (or could not be read).
    NotVeinBlock,
    /// The held tool cannot vein mine this block.
    WrongTool,
    /// The held tool has no durability left.
    ToolExhausted,
    /// The block has no same-kind neighbours.
    SingleBlock,
}

/// What a claimed harvest did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestReport {
    /// Kind of the vein.
    pub kind: BlockKind,
    /// Blocks discovered by the search.
    pub discovered: usize,
    /// Blocks actually broken.
    pub mined: usize,
    /// Blocks skipped because of a per-block failure.
    pub failed: usize,
    /// Total experience spawned.
    pub xp: u64,
    /// Items that did not fit the inventory.
    pub items_not_picked_up: u64,
    /// The tool broke during the harvest.
    pub tool_broken: bool,
    /// Milestones granted by this harvest.
    pub milestones: Vec<u64>,
}

/// Result of reporting a break.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Not vein-mined; the host handles the break normally.
    Skipped(SkipReason),
    /// Vein-mined; the host must suppress its own handling of the break.
    Harvested(HarvestReport),
}

impl HarvestOutcome {
    /// Returns true if the host must suppress its default break logic.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        matches!(self, Self::Harvested(_))
    }

    /// The report of a claimed harvest.
    #[must_use]
    pub const fn report(&self) -> Option<&HarvestReport> {
        match self {
            Self::Harvested(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

/// Running totals of the per-block loop.
#[derive(Debug, Default)]
struct LoopTotals {
    mined: usize,
    failed: usize,
    xp: u64,
    not_picked_up: u64,
    tool_broken: bool,
}

/// Drives vein harvests under one configuration.
#[derive(Debug)]
pub struct VeinHarvestCoordinator {
    config: VeinMinerConfig,
    vein_kinds: HashSet<BlockKind>,
    eligibility: ToolEligibilityCache,
}

impl VeinHarvestCoordinator {
    /// Creates a coordinator for `config`.
    #[must_use]
    pub fn new(config: VeinMinerConfig) -> Self {
        let eligibility = ToolEligibilityCache::with_capacity(config.cache.max_entries);
        let vein_kinds = config.vein_blocks.iter().cloned().collect();
        Self {
            config,
            vein_kinds,
            eligibility,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &VeinMinerConfig {
        &self.config
    }

    /// The eligibility cache.
    #[must_use]
    pub fn eligibility(&self) -> &ToolEligibilityCache {
        &self.eligibility
    }

    /// Switches to `config` and clears the eligibility cache.
    pub fn reconfigure(&mut self, config: VeinMinerConfig) {
        if config.cache.max_entries == self.eligibility.capacity() {
            self.eligibility.clear();
        } else {
            self.eligibility = ToolEligibilityCache::with_capacity(config.cache.max_entries);
        }
        self.vein_kinds = config.vein_blocks.iter().cloned().collect();
        self.config = config;
    }

    /// Returns true if `kind` is configured as vein-mineable.
    #[must_use]
    pub fn is_vein_kind(&self, kind: &BlockKind) -> bool {
        self.vein_kinds.contains(kind)
    }

    fn check_preconditions<W, M>(
        &self,
        world: &W,
        miner: &M,
        seed: Coordinate,
        toggles: &ToggleRegistry,
    ) -> Result<(BlockKind, Option<ToolItem>), SkipReason>
    where
        W: HostWorld + ?Sized,
        M: Miner + ?Sized,
    {
        if !miner.has_permission(USE_PERMISSION) {
            return Err(SkipReason::NoPermission);
        }
        if toggles.is_disabled(miner.id()) {
            return Err(SkipReason::ToggledOff);
        }
        if self.config.is_zone_disabled(miner.zone()) {
            return Err(SkipReason::DisabledZone);
        }
        if !miner.is_sneaking() {
            return Err(SkipReason::NotSneaking);
        }

        let kind = world
            .block_kind_at(seed)
            .ok()
            .filter(|kind| self.is_vein_kind(kind))
            .ok_or(SkipReason::NotVeinBlock)?;

        let tool = miner.held_tool();
        let tool_kind = tool.as_ref().map_or_else(ToolKind::empty_hand, |t| t.kind.clone());
        if !self.eligibility.is_allowed(&kind, &tool_kind) {
            return Err(SkipReason::WrongTool);
        }
        if tool.as_ref().is_some_and(ToolItem::is_exhausted) {
            return Err(SkipReason::ToolExhausted);
        }

        Ok((kind, tool))
    }

    /// Blocks the tool can pay for at `cost` per block; unlimited for an
    /// unbreakable tool or an empty hand.
    fn affordable(tool: Option<&ToolItem>, cost: u32) -> usize {
        match tool.and_then(ToolItem::remaining) {
            // The block that exhausts the tool is still mined
            Some(remaining) => usize::try_from(remaining.div_ceil(cost.max(1))).unwrap_or(usize::MAX),
            None => usize::MAX,
        }
    }

    /// Handles a break at `seed` by `miner`.
    ///
    /// Returns [`HarvestOutcome::Skipped`] when any precondition fails or
    /// the vein is a single block; the world is untouched in that case.
    pub fn harvest<W, M>(
        &self,
        world: &mut W,
        miner: &mut M,
        seed: Coordinate,
        toggles: &ToggleRegistry,
        stats: &StatisticsStore,
    ) -> HarvestOutcome
    where
        W: HostWorld + ?Sized,
        M: Miner + ?Sized,
    {
        let (kind, mut tool) = match self.check_preconditions(&*world, &*miner, seed, toggles) {
            Ok(found) => found,
            Err(reason) => return HarvestOutcome::Skipped(reason),
        };

        let vein = find_vein(seed, &kind, self.config.max_blocks, &*world);
        if vein.len() <= 1 {
            return HarvestOutcome::Skipped(SkipReason::SingleBlock);
        }

        let log_activity = self.config.logging.vein_mining();
        if log_activity {
            tracing::info!(player = %miner.name(), block = %kind, vein = vein.len(), "vein mining");
        }
        let tip = self.config.messages.vein_tip.replace("{count}", &vein.len().to_string());
        miner.send_tip(&tip);

        let cost = self.config.durability_cost();
        let budget = Self::affordable(tool.as_ref(), cost);
        let mut totals = LoopTotals::default();
        let hand = ToolItem::unbreakable(ToolKind::empty_hand());

        for &at in &vein {
            // Failed blocks cost nothing, so only mined blocks use the budget
            if totals.mined == budget {
                break;
            }
            let drops_tool = tool.as_ref().unwrap_or(&hand);
            match self.break_block(world, miner, at, &kind, drops_tool, &mut totals) {
                Ok(()) => totals.mined += 1,
                Err(e) => {
                    totals.failed += 1;
                    tracing::warn!(player = %miner.name(), error = %e, "skipping block in vein");
                    continue;
                }
            }

            if tool.as_mut().is_some_and(|t| t.apply_damage(cost)) {
                totals.tool_broken = true;
                break;
            }
        }

        self.finish(world, miner, seed, tool, &totals);

        let mined = u64::try_from(totals.mined).unwrap_or(u64::MAX);
        let milestones = stats.record_vein_mine(miner.id(), miner.name(), mined);

        HarvestOutcome::Harvested(HarvestReport {
            kind,
            discovered: vein.len(),
            mined: totals.mined,
            failed: totals.failed,
            xp: totals.xp,
            items_not_picked_up: totals.not_picked_up,
            tool_broken: totals.tool_broken,
            milestones,
        })
    }

    /// Breaks one block of the vein.
    fn break_block<W, M>(
        &self,
        world: &mut W,
        miner: &mut M,
        at: Coordinate,
        kind: &BlockKind,
        tool: &ToolItem,
        totals: &mut LoopTotals,
    ) -> BlockResult<()>
    where
        W: HostWorld + ?Sized,
        M: Miner + ?Sized,
    {
        // The world may have changed since the search
        match world.block_kind_at(at) {
            Ok(found) if found == *kind => {}
            Ok(found) => return Err(HarvestError::KindChanged { at, found }),
            Err(e) => {
                return Err(HarvestError::Unreadable {
                    at,
                    reason: e.to_string(),
                })
            }
        }

        let drops = world
            .compute_drops(at, kind, tool)
            .map_err(|reason| HarvestError::Drops { at, reason })?;
        world
            .clear_block(at)
            .map_err(|reason| HarvestError::ClearFailed { at, reason })?;

        let auto_pickup = &self.config.auto_pickup;
        for item in &drops.items {
            if !auto_pickup.enabled {
                world.drop_item(at, item);
                continue;
            }
            let leftover = miner.give(item);
            if leftover > 0 {
                totals.not_picked_up += u64::from(leftover);
                if auto_pickup.full_inventory_action == FullInventoryAction::Drop {
                    world.drop_item(at, &ItemStack::new(item.item.clone(), leftover));
                }
            }
        }

        if self.config.effects.particles {
            world.spawn_particle(at, kind);
        }

        totals.xp += u64::from(drops.xp);
        Ok(())
    }

    /// Aggregated effects after the per-block loop.
    fn finish<W, M>(
        &self,
        world: &mut W,
        miner: &mut M,
        seed: Coordinate,
        tool: Option<ToolItem>,
        totals: &LoopTotals,
    )
    where
        W: HostWorld + ?Sized,
        M: Miner + ?Sized,
    {
        if totals.xp > 0 {
            world.spawn_xp_orb(seed, u32::try_from(totals.xp).unwrap_or(u32::MAX));
        }

        let log_activity = self.config.logging.vein_mining();
        if totals.not_picked_up > 0 {
            let action = self.config.auto_pickup.full_inventory_action.past_tense();
            let template = &self.config.messages.inventory_full;
            if !template.is_empty() {
                let message = template
                    .replace("{count}", &totals.not_picked_up.to_string())
                    .replace("{action}", action);
                miner.send_message(&message);
            }
            if log_activity {
                tracing::info!(player = %miner.name(), items = totals.not_picked_up, action, "inventory full during vein mining");
            }
        }

        if totals.tool_broken {
            miner.set_held_tool(None);
            world.play_sound(miner.id(), HarvestSound::ToolBreak);
            if log_activity {
                tracing::info!(player = %miner.name(), "tool broke during vein mining");
            }
        } else {
            if let Some(tool) = tool.filter(ToolItem::is_breakable) {
                miner.set_held_tool(Some(tool));
            }
            if self.config.effects.sounds {
                world.play_sound(miner.id(), HarvestSound::Complete);
            }
        }
    }
}
