//! Player configuration and the validated [`Profile`] built from it.
//!
//! [`ProfileConfig`] is the raw, flat option set as read from a config file.
//! Every field has a default, so a file only needs the options it changes.
//! [`Profile::new`] is the only way to obtain a [`Profile`]; it resolves the
//! mode, material and token allowance and rejects inconsistent options up
//! front, so evaluation never has to.

use crate::assignment::Budget;
use crate::catalog::{NodeId, NodeKind, PowderType};
use crate::stat::Stat;
use crate::tables::{GameData, Material};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Raw configuration
// ---------------------------------------------------------------------------

/// A configured target quantity. Anything but a number is rejected by
/// [`Profile::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetAmount {
    Number(f64),
    Flag(bool),
    Text(String),
}

/// Flat player configuration. Percent stats are in percent; powder boosts
/// are ratios (a 20% boost is `0.2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub reaction_speed: f64,

    pub mining_speed: f64,
    pub ore_speed: f64,
    pub mithril_speed: f64,
    pub dwarven_mines_speed: f64,
    pub gemstone_speed: f64,

    pub mining_spread: f64,
    pub hardstone_spread: f64,
    pub mines_of_divan_spread: f64,
    pub block_spread: f64,
    pub ore_and_block_spread: f64,

    pub pristine: f64,
    pub magma_fields_pristine: f64,
    pub corpse_pristine: f64,

    pub mining_fortune: f64,
    pub mining_fortune_mult: f64,
    pub ore_fortune: f64,
    pub block_fortune: f64,
    pub mithril_fortune: f64,
    pub titanium_fortune: f64,
    pub dwarven_metal_fortune: f64,
    pub gemstone_fortune: f64,
    pub dwarven_mines_fortune: f64,
    pub crystal_hollows_fortune: f64,
    pub mineshafts_fortune: f64,
    pub scraped_fortune: f64,
    pub cold_fortune: f64,
    pub fiesta_fortune: f64,

    pub fiesta_titanium_chance: f64,

    pub mining_wisdom: f64,

    pub global_powder_boost: f64,
    pub fiesta_powder_boost: f64,
    pub mithril_powder_boost: f64,
    pub titanium_powder_gain: f64,
    pub gemstone_powder_boost: f64,
    pub glacite_powder_boost: f64,
    pub treasure_chest_chance: f64,

    pub using_blue_cheese: bool,
    pub compact_level: u32,
    pub flowstate_level: f64,

    // Accepted, not modeled.
    pub heat_resistance: f64,
    pub cold_resistance: f64,
    pub mineral_chance: f64,
    pub breaking_power: u32,

    pub heart_of_the_mountain: u32,
    pub core_of_the_mountain: u32,

    pub mithril_powder: u64,
    pub gemstone_powder: u64,
    pub glacite_powder: u64,

    pub mode: String,
    pub ore: Option<String>,
    pub powder_type: Option<String>,
    pub consider_fortune: bool,
    pub is_fiesta: bool,
    pub use_titanium: bool,
    pub is_amplified: bool,
    /// Snap block break times to whole game ticks.
    pub round_ticks: bool,
    pub target_amount: Option<TargetAmount>,
    pub force_ability: Option<String>,

    /// Explicit tree to optimize.
    pub given_tree: Option<Vec<String>>,
    /// Nodes an assembled tree must contain when no tree is given.
    pub required_nodes: Vec<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            reaction_speed: 0.1,
            mining_speed: 0.0,
            ore_speed: 0.0,
            mithril_speed: 0.0,
            dwarven_mines_speed: 0.0,
            gemstone_speed: 0.0,
            mining_spread: 0.0,
            hardstone_spread: 0.0,
            mines_of_divan_spread: 0.0,
            block_spread: 0.0,
            ore_and_block_spread: 0.0,
            pristine: 0.0,
            magma_fields_pristine: 0.0,
            corpse_pristine: 0.0,
            mining_fortune: 0.0,
            mining_fortune_mult: 0.0,
            ore_fortune: 0.0,
            block_fortune: 0.0,
            mithril_fortune: 0.0,
            titanium_fortune: 0.0,
            dwarven_metal_fortune: 0.0,
            gemstone_fortune: 0.0,
            dwarven_mines_fortune: 0.0,
            crystal_hollows_fortune: 0.0,
            mineshafts_fortune: 0.0,
            scraped_fortune: 0.0,
            cold_fortune: 0.0,
            fiesta_fortune: 0.0,
            fiesta_titanium_chance: 0.0,
            mining_wisdom: 0.0,
            global_powder_boost: 0.0,
            fiesta_powder_boost: 0.0,
            mithril_powder_boost: 0.0,
            titanium_powder_gain: 0.0,
            gemstone_powder_boost: 0.0,
            glacite_powder_boost: 0.0,
            treasure_chest_chance: 0.0,
            using_blue_cheese: false,
            compact_level: 0,
            flowstate_level: 0.0,
            heat_resistance: 0.0,
            cold_resistance: 0.0,
            mineral_chance: 0.0,
            breaking_power: 5,
            heart_of_the_mountain: 1,
            core_of_the_mountain: 0,
            mithril_powder: 0,
            gemstone_powder: 0,
            glacite_powder: 0,
            mode: "ores".to_string(),
            ore: None,
            powder_type: None,
            consider_fortune: true,
            is_fiesta: false,
            use_titanium: false,
            is_amplified: false,
            round_ticks: false,
            target_amount: None,
            force_ability: None,
            given_tree: None,
            required_nodes: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What the score counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Items of the selected ore per minute.
    Ores,
    /// Powder of the selected type per minute.
    Powder,
    /// Mining experience per minute.
    Exp,
}

impl Mode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ores" => Some(Mode::Ores),
            "powder" => Some(Mode::Powder),
            "exp" => Some(Mode::Exp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Ores => "ores",
            Mode::Powder => "powder",
            Mode::Exp => "exp",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration rejected before any work is done.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown optimizer mode: {0:?}, only ores, powder and exp are supported")]
    UnknownMode(String),

    #[error("ore name not specified for {0} mode")]
    MissingOre(Mode),

    #[error("unknown ore name: {0:?}")]
    UnknownOre(String),

    #[error("powder type not specified for powder mode")]
    MissingPowderType,

    #[error("unknown powder type: {0:?}, valid powder types are mithril, gemstone and glacite")]
    UnknownPowderType(String),

    #[error("use_titanium must be true for titanium ore")]
    TitaniumRequired,

    #[error("use_titanium cannot be used with {0}")]
    TitaniumIneligible(String),

    #[error("reaction speed must be between 0.1s and 1s inclusive, got {0}")]
    ReactionSpeed(f64),

    #[error("heart of the mountain level {level} is outside 1..={max}")]
    HotmLevel { level: u32, max: u32 },

    #[error("core of the mountain level {level} is outside 0..={max}")]
    CotmLevel { level: u32, max: u32 },

    #[error("compact level {level} is outside 0..={max}")]
    CompactLevel { level: u32, max: u32 },

    #[error("unknown ability name: {0:?}")]
    UnknownAbility(String),

    #[error("unknown node name: {0:?}")]
    UnknownNode(String),

    #[error("node {node:?} sits in tier {tier}, locked at heart of the mountain {hotm}")]
    TierLocked { node: String, tier: u8, hotm: u32 },

    #[error("target amount must be a number, got {0}")]
    NonNumericTarget(String),

    #[error("tokens not enough to build this tree: {needed} > {available}")]
    TokenBudgetExceeded { needed: usize, available: u32 },

    #[error("no relevant stats defined for task {0:?}")]
    MissingTaskStats(String),

    #[error("no tree given and no required nodes to assemble one from")]
    NoTree,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Validated, immutable player snapshot.
#[derive(Debug, Clone)]
pub struct Profile {
    config: ProfileConfig,
    mode: Mode,
    material: Material,
    powder: Option<PowderType>,
    consider_fortune: bool,
    tokens: u32,
    target_amount: Option<f64>,
    force_ability: Option<NodeId>,
    relevant_stats: Vec<Stat>,
}

impl Profile {
    /// Validate `config` against `data`.
    pub fn new(config: ProfileConfig, data: &GameData) -> Result<Self, ConfigError> {
        if !(0.1..=1.0).contains(&config.reaction_speed) {
            return Err(ConfigError::ReactionSpeed(config.reaction_speed));
        }

        let mode =
            Mode::from_name(&config.mode).ok_or_else(|| ConfigError::UnknownMode(config.mode.clone()))?;
        let (material, powder) = match mode {
            Mode::Ores | Mode::Exp => (resolve_ore(&config, mode)?, None),
            Mode::Powder => {
                let (material, powder) = resolve_powder(&config)?;
                (material, Some(powder))
            }
        };
        // Drops are what ores mode counts, so fortune always matters there.
        let consider_fortune = config.consider_fortune || mode == Mode::Ores;

        let catalog = &data.catalog;
        let hotm = config.heart_of_the_mountain;
        if hotm == 0 || hotm > catalog.max_hotm() {
            return Err(ConfigError::HotmLevel {
                level: hotm,
                max: catalog.max_hotm(),
            });
        }
        let cotm = config.core_of_the_mountain;
        let tokens = catalog.tokens(hotm, cotm).ok_or(ConfigError::CotmLevel {
            level: cotm,
            max: catalog.max_cotm(),
        })?;

        if config.compact_level > data.mining.max_compact_level() {
            return Err(ConfigError::CompactLevel {
                level: config.compact_level,
                max: data.mining.max_compact_level(),
            });
        }

        let force_ability = match &config.force_ability {
            None => None,
            Some(name) => match catalog.id(name) {
                Some(id) if catalog.node(id).kind == NodeKind::Ability => Some(id),
                _ => return Err(ConfigError::UnknownAbility(name.clone())),
            },
        };

        let target_amount = match &config.target_amount {
            None => None,
            Some(TargetAmount::Number(n)) => Some(*n),
            Some(TargetAmount::Flag(b)) => return Err(ConfigError::NonNumericTarget(format!("boolean {b}"))),
            Some(TargetAmount::Text(s)) => return Err(ConfigError::NonNumericTarget(format!("text {s:?}"))),
        };

        let relevant_stats = relevant_stats(data, mode, material, powder, consider_fortune)?;

        Ok(Self {
            config,
            mode,
            material,
            powder,
            consider_fortune,
            tokens,
            target_amount,
            force_ability,
            relevant_stats,
        })
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn material(&self) -> Material {
        self.material
    }

    /// Selected powder type; `Some` only in powder mode.
    pub fn powder(&self) -> Option<PowderType> {
        self.powder
    }

    /// Whether the cycle alternates filler mithril with titanium.
    pub fn chases_titanium(&self) -> bool {
        self.material == Material::Titanium
    }

    pub fn consider_fortune(&self) -> bool {
        self.consider_fortune
    }

    pub fn hotm(&self) -> u32 {
        self.config.heart_of_the_mountain
    }

    pub fn cotm(&self) -> u32 {
        self.config.core_of_the_mountain
    }

    /// Tokens available for tree cells, the core excluded.
    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    pub fn target_amount(&self) -> Option<f64> {
        self.target_amount
    }

    pub fn force_ability(&self) -> Option<NodeId> {
        self.force_ability
    }

    pub fn relevant_stats(&self) -> &[Stat] {
        &self.relevant_stats
    }

    pub fn budget(&self) -> Budget {
        Budget::new(
            self.config.mithril_powder,
            self.config.gemstone_powder,
            self.config.glacite_powder,
        )
    }

    /// Title of the unit the score counts, e.g. `"Mithril Powder"`.
    pub fn unit_name(&self) -> String {
        let snake = match self.powder {
            Some(powder) => format!("{powder}_powder"),
            None => self.material.name().to_string(),
        };
        snake
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

fn resolve_ore(config: &ProfileConfig, mode: Mode) -> Result<Material, ConfigError> {
    let name = config.ore.as_deref().ok_or(ConfigError::MissingOre(mode))?;
    let material = Material::from_ore_name(name).ok_or_else(|| ConfigError::UnknownOre(name.to_string()))?;
    match material {
        Material::Titanium if !config.use_titanium => Err(ConfigError::TitaniumRequired),
        Material::Titanium => Ok(material),
        // Only titanium ore and mithril powder chase titanium.
        other if config.use_titanium => Err(ConfigError::TitaniumIneligible(format!("{other} ore"))),
        other => Ok(other),
    }
}

fn resolve_powder(config: &ProfileConfig) -> Result<(Material, PowderType), ConfigError> {
    let name = config
        .powder_type
        .as_deref()
        .ok_or(ConfigError::MissingPowderType)?;
    let powder = PowderType::from_name(name).ok_or_else(|| ConfigError::UnknownPowderType(name.to_string()))?;
    let material = match powder {
        PowderType::Mithril if config.use_titanium => Material::Titanium,
        PowderType::Mithril => Material::Mithril,
        other if config.use_titanium => {
            return Err(ConfigError::TitaniumIneligible(format!("{other} powder mode")));
        }
        PowderType::Gemstone => Material::Hardstone,
        PowderType::Glacite => Material::Glacite,
    };
    Ok((material, powder))
}

/// Stats that matter for the task, from the task table.
fn relevant_stats(
    data: &GameData,
    mode: Mode,
    material: Material,
    powder: Option<PowderType>,
    consider_fortune: bool,
) -> Result<Vec<Stat>, ConfigError> {
    let (key, extra): (String, Option<Stat>) = match (mode, powder) {
        (Mode::Ores, _) => (material.name().to_string(), None),
        (Mode::Exp, _) => (material.name().to_string(), Some(Stat::MiningWisdom)),
        (Mode::Powder, Some(powder)) if consider_fortune => {
            let key = if material == Material::Titanium {
                "titanium".to_string()
            } else {
                powder.name().to_string()
            };
            (key, Some(Stat::PowderGain))
        }
        (Mode::Powder, Some(powder)) => (format!("{powder}_powder"), None),
        (Mode::Powder, None) => return Err(ConfigError::MissingPowderType),
    };
    let base = data
        .mining
        .task_stats(&key)
        .ok_or(ConfigError::MissingTaskStats(key.clone()))?;
    let mut stats = base.to_vec();
    stats.extend(extra);
    stats.sort_unstable();
    stats.dedup();
    Ok(stats)
}
