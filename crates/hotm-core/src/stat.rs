//! Fixed enumerated stat vector.
//!
//! Every stat a tree node can contribute has one slot in [`StatVector`], so a
//! misspelled stat name is rejected when data is loaded instead of silently
//! reading as zero during evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// A stat contributed by a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    AbilityCooldownReduction,
    BlockFortune,
    ColdResistance,
    DwarvenMetalFortune,
    DwarvenMetalSpeed,
    GemstoneFortune,
    GemstonePowder,
    GemstoneSpeed,
    GlacitePowder,
    GoblinChance,
    HardstoneSpread,
    HeatResistance,
    HotmXpGain,
    MineshaftAbilityCooldownReduction,
    MineshaftFortune,
    MineshaftGemstoneSpread,
    MineshaftMiningSpread,
    MineshaftSpeed,
    MiningFortune,
    MiningSpeed,
    MiningSpread,
    MiningWisdom,
    MithrilPowder,
    OreFortune,
    OreSpeed,
    PowderGain,
    Pristine,
    RareOccurrences,
    TitaniumChance,
    /// Titanium drop multiplier. A total of zero means no node grants it and
    /// the drops are left unscaled (multiplier 1), not zeroed.
    TitaniumDrop,
    TreasureChestChance,
}

impl Stat {
    /// Number of stat slots.
    pub const COUNT: usize = 31;

    /// Every stat, in slot order.
    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::AbilityCooldownReduction,
        Stat::BlockFortune,
        Stat::ColdResistance,
        Stat::DwarvenMetalFortune,
        Stat::DwarvenMetalSpeed,
        Stat::GemstoneFortune,
        Stat::GemstonePowder,
        Stat::GemstoneSpeed,
        Stat::GlacitePowder,
        Stat::GoblinChance,
        Stat::HardstoneSpread,
        Stat::HeatResistance,
        Stat::HotmXpGain,
        Stat::MineshaftAbilityCooldownReduction,
        Stat::MineshaftFortune,
        Stat::MineshaftGemstoneSpread,
        Stat::MineshaftMiningSpread,
        Stat::MineshaftSpeed,
        Stat::MiningFortune,
        Stat::MiningSpeed,
        Stat::MiningSpread,
        Stat::MiningWisdom,
        Stat::MithrilPowder,
        Stat::OreFortune,
        Stat::OreSpeed,
        Stat::PowderGain,
        Stat::Pristine,
        Stat::RareOccurrences,
        Stat::TitaniumChance,
        Stat::TitaniumDrop,
        Stat::TreasureChestChance,
    ];

    /// Slot index of this stat in a [`StatVector`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The snake_case name used in data files.
    pub fn name(self) -> &'static str {
        match self {
            Stat::AbilityCooldownReduction => "ability_cooldown_reduction",
            Stat::BlockFortune => "block_fortune",
            Stat::ColdResistance => "cold_resistance",
            Stat::DwarvenMetalFortune => "dwarven_metal_fortune",
            Stat::DwarvenMetalSpeed => "dwarven_metal_speed",
            Stat::GemstoneFortune => "gemstone_fortune",
            Stat::GemstonePowder => "gemstone_powder",
            Stat::GemstoneSpeed => "gemstone_speed",
            Stat::GlacitePowder => "glacite_powder",
            Stat::GoblinChance => "goblin_chance",
            Stat::HardstoneSpread => "hardstone_spread",
            Stat::HeatResistance => "heat_resistance",
            Stat::HotmXpGain => "hotm_xp_gain",
            Stat::MineshaftAbilityCooldownReduction => "mineshaft_ability_cooldown_reduction",
            Stat::MineshaftFortune => "mineshaft_fortune",
            Stat::MineshaftGemstoneSpread => "mineshaft_gemstone_spread",
            Stat::MineshaftMiningSpread => "mineshaft_mining_spread",
            Stat::MineshaftSpeed => "mineshaft_speed",
            Stat::MiningFortune => "mining_fortune",
            Stat::MiningSpeed => "mining_speed",
            Stat::MiningSpread => "mining_spread",
            Stat::MiningWisdom => "mining_wisdom",
            Stat::MithrilPowder => "mithril_powder",
            Stat::OreFortune => "ore_fortune",
            Stat::OreSpeed => "ore_speed",
            Stat::PowderGain => "powder_gain",
            Stat::Pristine => "pristine",
            Stat::RareOccurrences => "rare_occurrences",
            Stat::TitaniumChance => "titanium_chance",
            Stat::TitaniumDrop => "titanium_drop",
            Stat::TreasureChestChance => "treasure_chest_chance",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// StatVector
// ---------------------------------------------------------------------------

/// Additive accumulator with one `f64` slot per [`Stat`]. Starts at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatVector([f64; Stat::COUNT]);

impl StatVector {
    pub fn new() -> Self {
        Self([0.0; Stat::COUNT])
    }

    /// Add `amount` to the slot for `stat`.
    pub fn add(&mut self, stat: Stat, amount: f64) {
        self.0[stat.index()] += amount;
    }

    pub fn get(&self, stat: Stat) -> f64 {
        self.0[stat.index()]
    }

    /// Iterate over the non-zero slots.
    pub fn non_zero(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::ALL
            .iter()
            .map(|&stat| (stat, self.get(stat)))
            .filter(|(_, value)| *value != 0.0)
    }
}

impl Default for StatVector {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Stat> for StatVector {
    type Output = f64;

    fn index(&self, stat: Stat) -> &f64 {
        &self.0[stat.index()]
    }
}

impl IndexMut<Stat> for StatVector {
    fn index_mut(&mut self, stat: Stat) -> &mut f64 {
        &mut self.0[stat.index()]
    }
}
