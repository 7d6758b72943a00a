//! # Tool Eligibility
//!
//! Decides whether a (block kind, tool kind) pair qualifies for vein mining:
//!
//! | block class | required tool |
//! |-------------|---------------|
//! | ore, ancient debris | pickaxe |
//! | log, stem | axe |
//! | leaves | anything, including an empty hand |
//! | other | never eligible |
//!
//! The rule is evaluated once per unique pair and memoised. The cache is an
//! owned component, shared between concurrent harvests, with a hard size
//! ceiling: when an insert would exceed it the whole cache is swept.
//! Config reloads call [`ToolEligibilityCache::clear`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::kind::{BlockClass, BlockKind, ToolClass, ToolKind};

/// Default number of memoised pairs before the cache is swept.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Applies the eligibility rule without touching any cache.
#[must_use]
pub fn classify(block: &BlockKind, tool: &ToolKind) -> bool {
    match block.class() {
        BlockClass::Ore => tool.class() == ToolClass::Pickaxe,
        BlockClass::Log => tool.class() == ToolClass::Axe,
        BlockClass::Leaves => true,
        BlockClass::Other => false,
    }
}

/// Concurrent, bounded memo of (block kind, tool kind) -> allowed.
#[derive(Debug)]
pub struct ToolEligibilityCache {
    /// Memoised decisions.
    entries: RwLock<HashMap<(BlockKind, ToolKind), bool>>,
    /// Maximum entries kept before a sweep.
    capacity: usize,
    /// Lookups answered from the cache.
    hits: AtomicU64,
    /// Lookups that had to classify.
    misses: AtomicU64,
    /// Number of times the cache was swept for hitting its ceiling.
    sweeps: AtomicU64,
}

impl ToolEligibilityCache {
    /// Creates a cache with the default ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` pairs (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY))),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
        }
    }

    /// Returns whether `tool` may vein-mine `block`, memoising the answer.
    pub fn is_allowed(&self, block: &BlockKind, tool: &ToolKind) -> bool {
        let key = (block.clone(), tool.clone());

        if let Some(&allowed) = self.entries.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return allowed;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let allowed = classify(block, tool);

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            tracing::debug!(
                capacity = self.capacity,
                "tool eligibility cache full, sweeping"
            );
            entries.clear();
            self.sweeps.fetch_add(1, Ordering::Relaxed);
        }
        entries.insert(key, allowed);
        allowed
    }

    /// Drops every memoised decision. Called by the config reload path.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of memoised pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is memoised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Configured ceiling.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// (hits, misses, sweeps) since creation.
    #[must_use]
    pub fn counters(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.sweeps.load(Ordering::Relaxed),
        )
    }
}

impl Default for ToolEligibilityCache {
    fn default() -> Self {
        Self::new()
    }
}
