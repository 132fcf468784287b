//! Mining lookup tables: block strengths and drops, compact enchant chances,
//! and the relevant-stat sets per task.

use crate::catalog::{CatalogError, NodeCatalog, NodeId};
use crate::stat::Stat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// What is being mined. Selects the block stats and the stat adjustments
/// applied during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Ore,
    Mithril,
    Titanium,
    Glacite,
    Ruby,
    Amber,
    Topaz,
    Jasper,
    Aquamarine,
    /// Gemstone powder grinding. Not selectable as an ore.
    Hardstone,
}

impl Material {
    pub const ALL: [Material; 10] = [
        Material::Ore,
        Material::Mithril,
        Material::Titanium,
        Material::Glacite,
        Material::Ruby,
        Material::Amber,
        Material::Topaz,
        Material::Jasper,
        Material::Aquamarine,
        Material::Hardstone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Material::Ore => "ore",
            Material::Mithril => "mithril",
            Material::Titanium => "titanium",
            Material::Glacite => "glacite",
            Material::Ruby => "ruby",
            Material::Amber => "amber",
            Material::Topaz => "topaz",
            Material::Jasper => "jasper",
            Material::Aquamarine => "aquamarine",
            Material::Hardstone => "hardstone",
        }
    }

    /// Parse a user-facing ore selector. Hardstone is not accepted.
    pub fn from_ore_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|m| *m != Material::Hardstone)
            .find(|m| m.name() == name)
    }

    /// Name of the block whose strength and drops apply.
    pub fn block_name(self) -> &'static str {
        match self {
            Material::Mithril => "blue_mithril",
            other => other.name(),
        }
    }

    pub fn is_gemstone(self) -> bool {
        matches!(
            self,
            Material::Ruby | Material::Amber | Material::Topaz | Material::Jasper | Material::Aquamarine
        )
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    pub strength: f64,
    pub drops: f64,
    /// Drops under the amplified flag (redstone and lapis style ores).
    #[serde(default)]
    pub amplified_drops: Option<f64>,
}

impl BlockDef {
    pub fn drops(&self, amplified: bool) -> f64 {
        match self.amplified_drops {
            Some(d) if amplified => d,
            _ => self.drops,
        }
    }
}

// ---------------------------------------------------------------------------
// MiningTables
// ---------------------------------------------------------------------------

/// Read-only tables consumed by the evaluation engine.
#[derive(Debug, Clone)]
pub struct MiningTables {
    blocks: HashMap<String, BlockDef>,
    compact_chances: Vec<f64>,
    task_stats: HashMap<String, Vec<Stat>>,
    chest_lock_perk: Option<NodeId>,
}

impl MiningTables {
    /// Every material's block must be present in `blocks`.
    pub fn new(
        blocks: HashMap<String, BlockDef>,
        compact_chances: Vec<f64>,
        task_stats: HashMap<String, Vec<Stat>>,
        chest_lock_perk: Option<NodeId>,
    ) -> Result<Self, CatalogError> {
        for material in Material::ALL {
            if !blocks.contains_key(material.block_name()) {
                return Err(CatalogError::MissingBlock(material.block_name()));
            }
        }
        Ok(Self {
            blocks,
            compact_chances,
            task_stats,
            chest_lock_perk,
        })
    }

    /// Block mined for `material`.
    pub fn block(&self, material: Material) -> &BlockDef {
        // Presence checked in `new`.
        &self.blocks[material.block_name()]
    }

    /// Compact enchant chance (percent) at `level`, 1-based.
    pub fn compact_chance(&self, level: u32) -> Option<f64> {
        self.compact_chances
            .get((level as usize).checked_sub(1)?)
            .copied()
    }

    pub fn max_compact_level(&self) -> u32 {
        self.compact_chances.len() as u32
    }

    pub fn task_stats(&self, key: &str) -> Option<&[Stat]> {
        self.task_stats.get(key).map(Vec::as_slice)
    }

    pub fn task_keys(&self) -> impl Iterator<Item = &str> {
        self.task_stats.keys().map(String::as_str)
    }

    /// Perk that shortens treasure chest lock picking.
    pub fn chest_lock_perk(&self) -> Option<NodeId> {
        self.chest_lock_perk
    }
}

// ---------------------------------------------------------------------------
// GameData
// ---------------------------------------------------------------------------

/// Everything static: the tree catalog plus the mining tables.
#[derive(Debug, Clone)]
pub struct GameData {
    pub catalog: NodeCatalog,
    pub mining: MiningTables,
}
