//! Serde data file structs for the tree and mining tables.
//!
//! These are the on-disk shapes of `nodes`, `layout` and `mining`. They are
//! deserialized from RON, JSON or TOML and then resolved into `hotm-core`
//! types by the loader.

use hotm_core::catalog::{Effect, NodeKind, PowderType};
use hotm_core::stat::Stat;
use hotm_core::tables::BlockDef;
use serde::Deserialize;
use std::collections::HashMap;

// ===========================================================================
// Nodes
// ===========================================================================

/// One node of the tree, without its position.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeData {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub related_stats: Vec<Stat>,
    /// Present on nodes that are bought level by level.
    #[serde(default)]
    pub max_level: Option<u32>,
    #[serde(default = "default_pad")]
    pub pad: u32,
    #[serde(default)]
    pub exponent: Option<f64>,
}

fn default_pad() -> u32 {
    1
}

// ===========================================================================
// Layout
// ===========================================================================

/// Grid placement, per-tier powder and token allowances.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutData {
    /// Rows bottom tier first; an empty string marks an empty cell.
    pub rows: Vec<Vec<String>>,
    /// Funding powder of each tier, bottom first.
    pub powder: Vec<PowderType>,
    pub entry: String,
    pub core: String,
    /// Cumulative tokens at HOTM level 1, 2, ...
    pub tokens_hotm: Vec<u32>,
    /// Cumulative bonus tokens at COTM level 0, 1, ...
    pub tokens_cotm: Vec<u32>,
}

// ===========================================================================
// Mining tables
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MiningData {
    pub blocks: HashMap<String, BlockDef>,
    /// Compact enchant proc chance in percent, level 1 first.
    pub compact_chances: Vec<f64>,
    pub task_stats: HashMap<String, Vec<Stat>>,
    /// Node whose level shortens treasure chest lockpicking.
    #[serde(default)]
    pub chest_lock_perk: Option<String>,
}
