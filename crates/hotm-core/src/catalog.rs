//! Node catalog and cost model.
//!
//! The catalog is the immutable description of the tree: which node sits in
//! which grid cell, what it contributes, which powder funds it, and how much
//! each level costs. It is assembled once through [`NodeCatalogBuilder`] and
//! validated on [`NodeCatalogBuilder::build`]; every query after that is a
//! pure lookup.
//!
//! # Cost model
//!
//! A leveled node's next level costs `(level + pad + 1) ^ exponent`,
//! truncated to an integer. The cumulative table is precomputed at build time
//! so that `table[k]` is the total spent to raise the node from level 0 to
//! level `k`.

use crate::stat::Stat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Grid cells are addressed by a bit index, so a grid holds at most this many.
pub const MAX_CELLS: usize = 128;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifies a node in a [`NodeCatalog`]. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u16);

/// A grid cell: `tier` is the row counted from the bottom, `slot` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub tier: u8,
    pub slot: u8,
}

impl Position {
    pub const fn new(tier: u8, slot: u8) -> Self {
        Self { tier, slot }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.tier, self.slot)
    }
}

// ---------------------------------------------------------------------------
// Powder
// ---------------------------------------------------------------------------

/// The three upgrade currencies. Each tier of the tree is funded by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowderType {
    Mithril,
    Gemstone,
    Glacite,
}

impl PowderType {
    pub const ALL: [PowderType; 3] = [PowderType::Mithril, PowderType::Gemstone, PowderType::Glacite];

    pub fn name(self) -> &'static str {
        match self {
            PowderType::Mithril => "mithril",
            PowderType::Gemstone => "gemstone",
            PowderType::Glacite => "glacite",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for PowderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Node definitions
// ---------------------------------------------------------------------------

/// What a node does once selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Continuous stat node, leveled with powder.
    Stat,
    /// Activatable pickaxe ability.
    Ability,
    /// Anything else: fixed perks, toggles, the core.
    Misc,
}

/// A stat contribution of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// `initial + (level + bonus) * per_level`.
    Scaling {
        stat: Stat,
        initial: f64,
        per_level: f64,
    },
    /// A constant, independent of level.
    Flat { stat: Stat, value: f64 },
}

impl Effect {
    pub fn stat(&self) -> Stat {
        match self {
            Effect::Scaling { stat, .. } | Effect::Flat { stat, .. } => *stat,
        }
    }

    /// Contribution at `level`, with `bonus` extra levels granted by
    /// external effects.
    pub fn value_at(&self, level: u32, bonus: u32) -> f64 {
        match self {
            Effect::Scaling {
                initial, per_level, ..
            } => initial + f64::from(level + bonus) * per_level,
            Effect::Flat { value, .. } => *value,
        }
    }
}

/// Powder cost curve of a leveled node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostCurve {
    pub pad: u32,
    pub exponent: f64,
}

impl CostCurve {
    /// Cost of buying the level after `level`.
    pub fn cost_of(&self, level: u32) -> u64 {
        let base = f64::from(level) + f64::from(self.pad) + 1.0;
        // `as` saturates, which is the truncation we want.
        base.powf(self.exponent) as u64
    }
}

/// Max level and cost curve of a leveled node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leveling {
    pub max_level: u32,
    pub curve: CostCurve,
}

/// Static description of one tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub position: Position,
    pub kind: NodeKind,
    pub effects: Vec<Effect>,
    /// Stats an ability or misc node is considered relevant to without
    /// contributing to them through an effect.
    pub related_stats: Vec<Stat>,
    pub leveling: Option<Leveling>,
}

impl NodeDef {
    /// A continuous stat node.
    #[allow(clippy::too_many_arguments)]
    pub fn stat(
        name: &str,
        position: Position,
        stat: Stat,
        initial: f64,
        per_level: f64,
        max_level: u32,
        pad: u32,
        exponent: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            position,
            kind: NodeKind::Stat,
            effects: vec![Effect::Scaling {
                stat,
                initial,
                per_level,
            }],
            related_stats: Vec::new(),
            leveling: Some(Leveling {
                max_level,
                curve: CostCurve { pad, exponent },
            }),
        }
    }

    pub fn ability(name: &str, position: Position, related_stats: Vec<Stat>) -> Self {
        Self {
            name: name.to_string(),
            position,
            kind: NodeKind::Ability,
            effects: Vec::new(),
            related_stats,
            leveling: None,
        }
    }

    pub fn misc(name: &str, position: Position, effects: Vec<Effect>) -> Self {
        Self {
            name: name.to_string(),
            position,
            kind: NodeKind::Misc,
            effects,
            related_stats: Vec::new(),
            leveling: None,
        }
    }

    pub fn with_related(mut self, stats: Vec<Stat>) -> Self {
        self.related_stats = stats;
        self
    }

    /// Whether this node can be bought level by level.
    pub fn is_leveled(&self) -> bool {
        self.kind == NodeKind::Stat && self.leveling.is_some()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or querying a [`NodeCatalog`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("grid of {tiers}x{slots} exceeds {max} cells", max = MAX_CELLS)]
    GridTooLarge { tiers: u8, slots: u8 },

    #[error("powder table has {found} tiers, grid has {expected}")]
    PowderTableLength { expected: usize, found: usize },

    #[error("HOTM token table has {found} levels, grid has {expected} tiers")]
    TokenTableLength { expected: usize, found: usize },

    #[error("COTM token table is empty")]
    EmptyCotmTable,

    #[error("duplicate node name: {0}")]
    DuplicateName(String),

    #[error("nodes {first:?} and {second:?} share position {position}")]
    DuplicatePosition {
        first: String,
        second: String,
        position: Position,
    },

    #[error("node {name:?} at {position} is outside the grid")]
    OutOfGrid { name: String, position: Position },

    #[error("no {0} node designated")]
    MissingAnchor(&'static str),

    #[error("{role} node {name:?} is not in the catalog")]
    UnknownAnchor { role: &'static str, name: String },

    #[error("invalid leveling on node {name:?}: {reason}")]
    InvalidLeveling { name: String, reason: &'static str },

    #[error("node not found or not leveled: {0}")]
    NotLeveled(String),

    #[error("no block data for {0}")]
    MissingBlock(&'static str),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for an immutable [`NodeCatalog`].
///
/// Nodes are registered in any order; all structural checks run in
/// [`build`](Self::build).
#[derive(Debug)]
pub struct NodeCatalogBuilder {
    tiers: u8,
    slots: u8,
    tier_powder: Vec<PowderType>,
    nodes: Vec<NodeDef>,
    entry: Option<String>,
    core: Option<String>,
    tokens_hotm: Vec<u32>,
    tokens_cotm: Vec<u32>,
}

impl NodeCatalogBuilder {
    pub fn new(tiers: u8, slots: u8) -> Self {
        Self {
            tiers,
            slots,
            tier_powder: Vec::new(),
            nodes: Vec::new(),
            entry: None,
            core: None,
            tokens_hotm: Vec::new(),
            tokens_cotm: Vec::new(),
        }
    }

    /// Powder funding each tier, bottom tier first.
    pub fn tier_powder(&mut self, powder: Vec<PowderType>) -> &mut Self {
        self.tier_powder = powder;
        self
    }

    /// Token allowance by HOTM level (index 0 is level 1) and by COTM level
    /// (index 0 is level 0).
    pub fn token_tables(&mut self, hotm: Vec<u32>, cotm: Vec<u32>) -> &mut Self {
        self.tokens_hotm = hotm;
        self.tokens_cotm = cotm;
        self
    }

    /// The bottom node every tree must connect to.
    pub fn entry(&mut self, name: &str) -> &mut Self {
        self.entry = Some(name.to_string());
        self
    }

    /// The token-free core node.
    pub fn core(&mut self, name: &str) -> &mut Self {
        self.core = Some(name.to_string());
        self
    }

    /// Register a node. Returns the id it will carry in the built catalog.
    pub fn register(&mut self, node: NodeDef) -> NodeId {
        let id = NodeId(self.nodes.len() as u16);
        self.nodes.push(node);
        id
    }

    pub fn build(self) -> Result<NodeCatalog, CatalogError> {
        let cells = usize::from(self.tiers) * usize::from(self.slots);
        if cells > MAX_CELLS {
            return Err(CatalogError::GridTooLarge {
                tiers: self.tiers,
                slots: self.slots,
            });
        }
        if self.tier_powder.len() != usize::from(self.tiers) {
            return Err(CatalogError::PowderTableLength {
                expected: usize::from(self.tiers),
                found: self.tier_powder.len(),
            });
        }
        if self.tokens_hotm.len() != usize::from(self.tiers) {
            return Err(CatalogError::TokenTableLength {
                expected: usize::from(self.tiers),
                found: self.tokens_hotm.len(),
            });
        }
        if self.tokens_cotm.is_empty() {
            return Err(CatalogError::EmptyCotmTable);
        }

        let mut by_name = HashMap::with_capacity(self.nodes.len());
        let mut grid: Vec<Option<NodeId>> = vec![None; cells];
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u16);
            if by_name.insert(node.name.clone(), id).is_some() {
                return Err(CatalogError::DuplicateName(node.name.clone()));
            }
            let pos = node.position;
            if pos.tier >= self.tiers || pos.slot >= self.slots {
                return Err(CatalogError::OutOfGrid {
                    name: node.name.clone(),
                    position: pos,
                });
            }
            let cell = usize::from(pos.tier) * usize::from(self.slots) + usize::from(pos.slot);
            if let Some(other) = grid[cell] {
                return Err(CatalogError::DuplicatePosition {
                    first: self.nodes[other.0 as usize].name.clone(),
                    second: node.name.clone(),
                    position: pos,
                });
            }
            grid[cell] = Some(id);
            validate_leveling(node)?;
        }

        let anchor = |role: &'static str, name: Option<&String>| -> Result<NodeId, CatalogError> {
            let name = name.ok_or(CatalogError::MissingAnchor(role))?;
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| CatalogError::UnknownAnchor {
                    role,
                    name: name.clone(),
                })
        };
        let entry = anchor("entry", self.entry.as_ref())?;
        let core = anchor("core", self.core.as_ref())?;

        let cumulative = self
            .nodes
            .iter()
            .map(|node| match node.leveling {
                Some(lv) if node.is_leveled() => cumulative_table(&lv),
                _ => Vec::new(),
            })
            .collect();
        let node_stats = self.nodes.iter().map(contributed_stats).collect();
        let row_major = grid.iter().flatten().copied().collect();

        Ok(NodeCatalog {
            tiers: self.tiers,
            slots: self.slots,
            tier_powder: self.tier_powder,
            nodes: self.nodes,
            by_name,
            grid,
            row_major,
            cumulative,
            node_stats,
            entry,
            core,
            tokens_hotm: self.tokens_hotm,
            tokens_cotm: self.tokens_cotm,
        })
    }
}

fn validate_leveling(node: &NodeDef) -> Result<(), CatalogError> {
    let invalid = |reason| CatalogError::InvalidLeveling {
        name: node.name.clone(),
        reason,
    };
    let scaling = node
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::Scaling { .. }))
        .count();
    match (node.kind, node.leveling) {
        (NodeKind::Stat, Some(lv)) => {
            if scaling != 1 {
                return Err(invalid("leveled node needs exactly one scaling effect"));
            }
            if lv.max_level == 0 {
                return Err(invalid("max level is 0"));
            }
            if !(lv.curve.exponent > 0.0) {
                return Err(invalid("exponent must be positive"));
            }
        }
        (_, Some(_)) => return Err(invalid("only stat nodes can be leveled")),
        (_, None) if scaling > 0 => {
            return Err(invalid("scaling effect without a cost curve"));
        }
        _ => {}
    }
    Ok(())
}

/// `table[k]` = powder spent to go from level 0 to level `k`.
fn cumulative_table(leveling: &Leveling) -> Vec<u64> {
    let mut table = Vec::with_capacity(leveling.max_level as usize + 1);
    let mut total = 0u64;
    table.push(total);
    for level in 0..leveling.max_level {
        total = total.saturating_add(leveling.curve.cost_of(level));
        table.push(total);
    }
    table
}

fn contributed_stats(node: &NodeDef) -> Vec<Stat> {
    let mut stats: Vec<Stat> = match node.kind {
        NodeKind::Stat => node.effects.iter().map(Effect::stat).collect(),
        NodeKind::Ability | NodeKind::Misc => node
            .effects
            .iter()
            .map(Effect::stat)
            .chain(node.related_stats.iter().copied())
            .collect(),
    };
    stats.sort_unstable();
    stats.dedup();
    stats
}

// ---------------------------------------------------------------------------
// NodeCatalog
// ---------------------------------------------------------------------------

/// Immutable node catalog. Frozen after build; safe to share.
#[derive(Debug, Clone)]
pub struct NodeCatalog {
    tiers: u8,
    slots: u8,
    tier_powder: Vec<PowderType>,
    nodes: Vec<NodeDef>,
    by_name: HashMap<String, NodeId>,
    grid: Vec<Option<NodeId>>,
    row_major: Vec<NodeId>,
    cumulative: Vec<Vec<u64>>,
    node_stats: Vec<Vec<Stat>>,
    entry: NodeId,
    core: NodeId,
    tokens_hotm: Vec<u32>,
    tokens_cotm: Vec<u32>,
}

impl NodeCatalog {
    pub fn tiers(&self) -> u8 {
        self.tiers
    }

    pub fn slots(&self) -> u8 {
        self.slots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn core(&self) -> NodeId {
        self.core
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this catalog.
    pub fn node(&self, id: NodeId) -> &NodeDef {
        &self.nodes[id.0 as usize]
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeDef> {
        self.nodes.get(id.0 as usize)
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.node(id).position
    }

    /// Node occupying `pos`, if any.
    pub fn at(&self, pos: Position) -> Option<NodeId> {
        if pos.tier >= self.tiers || pos.slot >= self.slots {
            return None;
        }
        self.grid[self.cell_index(pos)]
    }

    /// Bit index of a cell: `tier * slots + slot`.
    pub fn cell_index(&self, pos: Position) -> usize {
        usize::from(pos.tier) * usize::from(self.slots) + usize::from(pos.slot)
    }

    /// Inverse of [`cell_index`](Self::cell_index).
    pub fn cell_position(&self, cell: usize) -> Position {
        let slots = usize::from(self.slots);
        Position::new((cell / slots) as u8, (cell % slots) as u8)
    }

    /// Node ids bottom tier first, left to right.
    pub fn row_major(&self) -> &[NodeId] {
        &self.row_major
    }

    /// Occupied cells orthogonally adjacent to `id`.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let Position { tier, slot } = self.position(id);
        let candidates = [
            (tier.checked_add(1), Some(slot)),
            (Some(tier), slot.checked_add(1)),
            (tier.checked_sub(1), Some(slot)),
            (Some(tier), slot.checked_sub(1)),
        ];
        candidates
            .into_iter()
            .filter_map(|(t, s)| Some(Position::new(t?, s?)))
            .filter_map(|pos| self.at(pos))
    }

    /// Ability nodes in row-major order.
    pub fn abilities(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.row_major
            .iter()
            .copied()
            .filter(|&id| self.node(id).kind == NodeKind::Ability)
    }

    // -- cost model ---------------------------------------------------------

    pub fn is_leveled(&self, id: NodeId) -> bool {
        !self.cumulative[id.0 as usize].is_empty()
    }

    pub fn max_level(&self, id: NodeId) -> Option<u32> {
        self.node(id)
            .leveling
            .filter(|_| self.is_leveled(id))
            .map(|lv| lv.max_level)
    }

    /// Cost of buying the level after `level`.
    pub fn cost_of(&self, id: NodeId, level: u32) -> Result<u64, CatalogError> {
        match self.node(id).leveling {
            Some(lv) if self.is_leveled(id) => Ok(lv.curve.cost_of(level)),
            _ => Err(CatalogError::NotLeveled(self.name(id).to_string())),
        }
    }

    /// Cumulative cost table indexed by level `0..=max_level`.
    pub fn cumulative_cost(&self, id: NodeId) -> Result<&[u64], CatalogError> {
        let table = &self.cumulative[id.0 as usize];
        if table.is_empty() {
            return Err(CatalogError::NotLeveled(self.name(id).to_string()));
        }
        Ok(table)
    }

    /// Powder that funds levels of `id`, by its tier.
    pub fn funding_currency(&self, id: NodeId) -> PowderType {
        self.tier_powder[usize::from(self.position(id).tier)]
    }

    /// Stats `id` contributes to or is related to, sorted.
    pub fn node_stats(&self, id: NodeId) -> &[Stat] {
        &self.node_stats[id.0 as usize]
    }

    // -- tokens -------------------------------------------------------------

    /// Token allowance at the given HOTM (1-based) and COTM (0-based) levels.
    pub fn tokens(&self, hotm: u32, cotm: u32) -> Option<u32> {
        let h = self.tokens_hotm.get((hotm as usize).checked_sub(1)?)?;
        let c = self.tokens_cotm.get(cotm as usize)?;
        Some(h + c)
    }

    pub fn max_hotm(&self) -> u32 {
        self.tokens_hotm.len() as u32
    }

    pub fn max_cotm(&self) -> u32 {
        self.tokens_cotm.len() as u32 - 1
    }
}
