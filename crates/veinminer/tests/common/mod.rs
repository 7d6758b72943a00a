//! In-memory host used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use uuid::Uuid;
use veinminer::{
    BlockDrops, BlockKind, Coordinate, HarvestSound, HostWorld, ItemStack, Miner, PlayerId, RewardSink, ToolItem,
};
use veinminer_core::{BlockSource, SparseWorld, WorldResult};

/// World backed by a [`SparseWorld`] that records every effect.
#[derive(Default)]
pub struct TestWorld {
    pub blocks: SparseWorld,
    pub dropped: Vec<(Coordinate, ItemStack)>,
    pub particles: Vec<Coordinate>,
    pub xp_orbs: Vec<(Coordinate, u32)>,
    pub sounds: Vec<HarvestSound>,
    pub clear_failures: HashSet<Coordinate>,
    pub drop_failures: HashSet<Coordinate>,
    pub xp_per_block: u32,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            xp_per_block: 1,
            ..Self::default()
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.blocks.count_of(&BlockKind::new(kind))
    }

    pub fn dropped_items(&self) -> u32 {
        self.dropped.iter().map(|(_, item)| item.count).sum()
    }
}

impl BlockSource for TestWorld {
    fn block_kind_at(&self, at: Coordinate) -> WorldResult<BlockKind> {
        self.blocks.block_kind_at(at)
    }
}

impl HostWorld for TestWorld {
    fn compute_drops(&self, at: Coordinate, kind: &BlockKind, _tool: &ToolItem) -> Result<BlockDrops, String> {
        if self.drop_failures.contains(&at) {
            return Err("loot table missing".to_string());
        }
        if kind.as_str().ends_with("_leaves") {
            return Ok(BlockDrops::default());
        }
        Ok(BlockDrops {
            items: vec![ItemStack::new(format!("{kind}_item"), 1)],
            xp: self.xp_per_block,
        })
    }

    fn clear_block(&mut self, at: Coordinate) -> Result<(), String> {
        if self.clear_failures.contains(&at) {
            return Err("protected region".to_string());
        }
        if self.blocks.clear(at) {
            Ok(())
        } else {
            Err("out of bounds".to_string())
        }
    }

    fn drop_item(&mut self, at: Coordinate, item: &ItemStack) {
        self.dropped.push((at, item.clone()));
    }

    fn spawn_particle(&mut self, at: Coordinate, _kind: &BlockKind) {
        self.particles.push(at);
    }

    fn spawn_xp_orb(&mut self, at: Coordinate, amount: u32) {
        self.xp_orbs.push((at, amount));
    }

    fn play_sound(&mut self, _player: PlayerId, sound: HarvestSound) {
        self.sounds.push(sound);
    }
}

/// A sneaking player with every permission and room for `capacity` items.
pub struct TestMiner {
    pub id: PlayerId,
    pub name: String,
    pub permissions: HashSet<String>,
    pub sneaking: bool,
    pub zone: String,
    pub tool: Option<ToolItem>,
    pub capacity: u32,
    pub inventory: HashMap<String, u32>,
    pub tips: Vec<String>,
    pub messages: Vec<String>,
}

impl TestMiner {
    pub fn new(tool: Option<ToolItem>) -> Self {
        Self {
            id: Uuid::from_u128(1),
            name: "Steve".to_string(),
            permissions: HashSet::from([veinminer::USE_PERMISSION.to_string()]),
            sneaking: true,
            zone: "world".to_string(),
            tool,
            capacity: u32::MAX,
            inventory: HashMap::new(),
            tips: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_pickaxe() -> Self {
        Self::new(Some(ToolItem::new("minecraft:stone_pickaxe", 0, 131)))
    }

    pub fn held_items(&self) -> u32 {
        self.inventory.values().sum()
    }
}

impl Miner for TestMiner {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn is_sneaking(&self) -> bool {
        self.sneaking
    }

    fn zone(&self) -> &str {
        &self.zone
    }

    fn held_tool(&self) -> Option<ToolItem> {
        self.tool.clone()
    }

    fn set_held_tool(&mut self, tool: Option<ToolItem>) {
        self.tool = tool;
    }

    fn give(&mut self, item: &ItemStack) -> u32 {
        let fits = item.count.min(self.capacity - self.held_items().min(self.capacity));
        *self.inventory.entry(item.item.clone()).or_default() += fits;
        item.count - fits
    }

    fn send_tip(&mut self, message: &str) {
        self.tips.push(message.to_string());
    }

    fn send_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Server side of reward delivery.
#[derive(Default)]
pub struct TestServer {
    pub online: HashSet<PlayerId>,
    pub messages: Vec<(PlayerId, String)>,
    pub commands: Vec<String>,
}

impl RewardSink for TestServer {
    fn is_online(&self, player: PlayerId) -> bool {
        self.online.contains(&player)
    }

    fn send_message(&mut self, player: PlayerId, message: &str) {
        self.messages.push((player, message.to_string()));
    }

    fn dispatch_command(&mut self, command: &str) -> Result<(), String> {
        self.commands.push(command.to_string());
        Ok(())
    }
}

/// A flat `w` x `d` slab of `kind` at y = 0, starting at the origin.
pub fn slab(world: &mut TestWorld, kind: &str, w: i32, d: i32) {
    world.blocks.fill(
        Coordinate::new(0, 0, 0),
        Coordinate::new(w - 1, 0, d - 1),
        &BlockKind::new(kind),
    );
}
