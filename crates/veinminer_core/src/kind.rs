//! # Block and Tool Kinds
//!
//! Kinds are opaque, namespaced identifier strings (`"minecraft:iron_ore"`,
//! `"ore:iron"`, `"diamond_pickaxe"`). The engine only compares them for
//! equality, except for classification, which is a pure function of the
//! identifier's tokens. No lookup table, no external state.
//!
//! Tokens are the identifier split on `:`, `_`, `/`, `.` and `-`, so
//! `"minecraft:deepslate_iron_ore"` has the tokens
//! `minecraft`, `deepslate`, `iron`, `ore`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Separators between identifier tokens.
static TOKEN_SEPARATORS: [char; 5] = [':', '_', '/', '.', '-'];

fn tokens(id: &str) -> impl Iterator<Item = &str> {
    id.split(&TOKEN_SEPARATORS[..]).filter(|t| !t.is_empty())
}

fn has_token(id: &str, wanted: &[&str]) -> bool {
    tokens(id).any(|t| wanted.iter().any(|w| t.eq_ignore_ascii_case(w)))
}

/// Vein-relevant category of a block kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockClass {
    /// Ores (and the single special "ancient debris" kind). Pickaxe only.
    Ore,
    /// Tree logs and nether stems. Axe only.
    Log,
    /// Leaves. Any tool, including an empty hand.
    Leaves,
    /// Everything else. Vein mining never applies.
    Other,
}

/// Category of a held tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolClass {
    /// Pickaxe-class tools.
    Pickaxe,
    /// Axe-class tools.
    Axe,
    /// Anything else, including an empty hand.
    Other,
}

/// Opaque identifier of a block type.
///
/// Cheap to clone; equality is plain string equality.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockKind(Arc<str>);

impl BlockKind {
    /// Creates a block kind from its identifier.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The kind a host reports for air.
    #[must_use]
    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    /// Returns the identifier.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies this kind for vein mining.
    #[must_use]
    pub fn class(&self) -> BlockClass {
        let id = self.as_str();
        if has_token(id, &["ore"]) || is_ancient_debris(id) {
            BlockClass::Ore
        } else if has_token(id, &["log", "stem"]) {
            BlockClass::Log
        } else if has_token(id, &["leaves", "leaf"]) {
            BlockClass::Leaves
        } else {
            BlockClass::Other
        }
    }
}

/// Ancient debris is the one non-ore block that mines like an ore.
fn is_ancient_debris(id: &str) -> bool {
    let path = id.rsplit(':').next().unwrap_or(id);
    path.eq_ignore_ascii_case("ancient_debris")
}

impl fmt::Debug for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockKind({})", self.as_str())
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BlockKind {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BlockKind {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// Opaque identifier of a held item.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolKind(Arc<str>);

impl ToolKind {
    /// Creates a tool kind from its identifier.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The empty hand.
    #[must_use]
    pub fn empty_hand() -> Self {
        Self::new("minecraft:air")
    }

    /// Returns the identifier.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies this tool.
    ///
    /// `"wood_pickaxe"` is a pickaxe, `"diamond_axe"` is an axe; the
    /// pickaxe's trailing "axe" is not mistaken for an axe because
    /// matching is done on whole tokens.
    #[must_use]
    pub fn class(&self) -> ToolClass {
        let id = self.as_str();
        if has_token(id, &["pickaxe"]) {
            ToolClass::Pickaxe
        } else if has_token(id, &["axe", "hatchet"]) {
            ToolClass::Axe
        } else {
            ToolClass::Other
        }
    }
}

impl fmt::Debug for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolKind({})", self.as_str())
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ToolKind {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ToolKind {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}
