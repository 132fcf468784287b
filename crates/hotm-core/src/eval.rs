//! Throughput evaluation.
//!
//! [`Profile::evaluate`] turns an [`Assignment`] into units per minute for
//! the profile's mode. It is pure: the same profile, data and assignment
//! always produce the same [`ScoreResult`].

use crate::assignment::Assignment;
use crate::catalog::{NodeCatalog, PowderType};
use crate::profile::{Mode, Profile};
use crate::stat::{Stat, StatVector};
use crate::tables::{GameData, Material};
use serde::{Deserialize, Serialize};

/// Game ticks per second.
pub const TICKS_PER_SECOND: f64 = 20.0;

/// Shortest break time the game allows, in ticks.
pub const MIN_TICKS: f64 = 4.0;

/// Average gemstone powder per treasure chest across rarities.
pub const GEMSTONE_CHEST_VALUE: f64 = 349.0054361184384;

/// Base treasure chest spawn chance per block.
pub const BASE_CHEST_CHANCE: f64 = 0.002;

/// Average drops gained from one compact enchant proc.
const COMPACT_PROC_DROPS: f64 = 160.0;

// ---------------------------------------------------------------------------
// ScoreResult
// ---------------------------------------------------------------------------

/// Score and the intermediate terms it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Units per minute.
    pub per_minute: f64,
    /// Seconds per harvest cycle.
    pub cycle_seconds: f64,
    /// Units gained per cycle.
    pub payoff: f64,
    pub fortune_multiplier: f64,
    pub powder_rate: f64,
    pub mining_speed: f64,
    pub mining_fortune: f64,
    pub mining_spread: f64,
    pub mining_wisdom: f64,
    pub pristine: f64,
    pub titanium_chance: f64,
}

impl ScoreResult {
    pub fn per_hour(&self) -> f64 {
        self.per_minute * 60.0
    }
}

/// Snap a break time to whole ticks. Times of one to three ticks take four;
/// hardstone below one tick breaks instantly.
pub fn round_tick(seconds: f64, is_hardstone: bool) -> f64 {
    let raw = seconds * TICKS_PER_SECOND;
    if is_hardstone && raw < 1.0 {
        return 0.0;
    }
    let mut ticks = raw.round_ties_even();
    if (1.0..MIN_TICKS).contains(&ticks) {
        ticks = MIN_TICKS;
    }
    ticks / TICKS_PER_SECOND
}

/// Sum the stat effects of every selected node.
pub fn aggregate(catalog: &NodeCatalog, assignment: &Assignment, blue_cheese: bool) -> StatVector {
    let bonus = u32::from(blue_cheese);
    let mut stats = StatVector::new();
    for (id, level) in assignment.iter() {
        let Some(node) = catalog.get(id) else {
            continue;
        };
        for effect in &node.effects {
            stats.add(effect.stat(), effect.value_at(level, bonus));
        }
    }
    stats
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Effective stats after baseline, nodes and material adjustments.
struct Composed {
    speed: f64,
    fortune: f64,
    spread: f64,
    wisdom: f64,
    powder_rate: f64,
    pristine: f64,
    titanium_chance: f64,
}

impl Profile {
    /// Units per minute under `assignment`, tick rounded when the profile
    /// asks for it.
    pub fn score(&self, data: &GameData, assignment: &Assignment) -> f64 {
        self.evaluate(data, assignment).per_minute
    }

    /// Units per minute without tick rounding. The optimizer compares
    /// assignments with this score: rounding snaps break times and lock
    /// counts to steps, so one more level can score lower.
    pub fn search_score(&self, data: &GameData, assignment: &Assignment) -> f64 {
        self.evaluate_with(data, assignment, false).per_minute
    }

    /// Full evaluation of `assignment`, honouring `round_ticks`.
    pub fn evaluate(&self, data: &GameData, assignment: &Assignment) -> ScoreResult {
        self.evaluate_with(data, assignment, self.config().round_ticks)
    }

    /// Full evaluation of `assignment` with tick rounding on or off.
    pub fn evaluate_with(&self, data: &GameData, assignment: &Assignment, round_ticks: bool) -> ScoreResult {
        let c = self.config();
        let stats = aggregate(&data.catalog, assignment, c.using_blue_cheese);
        let material = self.material();
        let mut composed = self.compose(&stats);

        let mut result = ScoreResult {
            mining_speed: composed.speed,
            mining_spread: composed.spread,
            mining_wisdom: composed.wisdom,
            pristine: composed.pristine,
            titanium_chance: composed.titanium_chance,
            ..ScoreResult::default()
        };
        if composed.speed <= 0.0 || (self.chases_titanium() && composed.titanium_chance <= 0.0) {
            result.mining_fortune = composed.fortune;
            result.powder_rate = composed.powder_rate;
            return result;
        }

        // -- cycle time -----------------------------------------------------
        let break_time = |material: Material| {
            let strength = data.mining.block(material).strength;
            let t = 1.5 * strength / composed.speed;
            if round_ticks {
                round_tick(t, material == Material::Hardstone)
            } else {
                t
            }
        };
        let fillers = 100.0 / composed.titanium_chance;
        let (mut cycle, blocks) = if self.chases_titanium() {
            let filler = break_time(Material::Mithril);
            let titanium = break_time(Material::Titanium);
            (filler * fillers + titanium, fillers + 1.0)
        } else {
            (break_time(material), 1.0)
        };
        cycle += c.reaction_speed * blocks;

        // -- fortune --------------------------------------------------------
        let mut fortune_mult = 1.0;
        if self.consider_fortune() {
            composed.fortune *= 1.0 + c.mining_fortune_mult;
            fortune_mult = 1.0 + composed.fortune / 100.0;
            if self.chases_titanium() {
                let drop = stats[Stat::TitaniumDrop];
                // zero: no node grants the multiplier
                if drop != 0.0 {
                    fortune_mult *= drop;
                }
            } else if material.is_gemstone() {
                let p = composed.pristine / 100.0;
                fortune_mult = fortune_mult * (1.0 - p) + fortune_mult * 20.0 * p;
            }
        }

        // -- payoff ---------------------------------------------------------
        let spread_mult = 1.0 + composed.spread / 100.0;
        let mut powder_rate = composed.powder_rate;
        let value = match (self.mode(), self.powder()) {
            (Mode::Ores | Mode::Exp, _) => {
                let mut value = data.mining.block(material).drops(c.is_amplified);
                if !material.is_gemstone()
                    && let Some(chance) = data.mining.compact_chance(c.compact_level)
                {
                    value += COMPACT_PROC_DROPS * chance / 100.0;
                }
                value *= fortune_mult;
                if self.mode() == Mode::Exp {
                    value *= 1.0 + composed.wisdom / 100.0;
                }
                value * spread_mult
            }
            (Mode::Powder, Some(powder)) => {
                let base = match powder {
                    PowderType::Mithril => {
                        powder_rate += c.mithril_powder_boost + stats[Stat::MithrilPowder] / 100.0;
                        let per_block = if self.cotm() >= 4 { 6.0 } else { 5.0 };
                        if self.chases_titanium() {
                            per_block * fillers + c.titanium_powder_gain
                        } else {
                            per_block
                        }
                    }
                    PowderType::Gemstone => {
                        powder_rate += c.gemstone_powder_boost + stats[Stat::GemstonePowder] / 100.0;
                        cycle += self.chest_time(data, assignment, &stats, composed.spread, round_ticks);
                        GEMSTONE_CHEST_VALUE
                    }
                    PowderType::Glacite => {
                        powder_rate += c.glacite_powder_boost + stats[Stat::GlacitePowder] / 100.0;
                        1.0
                    }
                };
                let mut value = base * powder_rate * fortune_mult;
                if powder != PowderType::Gemstone {
                    value *= spread_mult;
                }
                value
            }
            (Mode::Powder, None) => 0.0,
        };

        result.per_minute = value / cycle * 60.0;
        result.cycle_seconds = cycle;
        result.payoff = value;
        result.fortune_multiplier = fortune_mult;
        result.powder_rate = powder_rate;
        result.mining_fortune = composed.fortune;
        result
    }

    fn compose(&self, stats: &StatVector) -> Composed {
        let c = self.config();
        let fiesta = if c.is_fiesta { 1.0 } else { 0.0 };
        let mut s = Composed {
            speed: c.mining_speed + stats[Stat::MiningSpeed] + 200.0 * c.flowstate_level,
            fortune: c.mining_fortune + stats[Stat::MiningFortune] + fiesta * c.fiesta_fortune,
            spread: c.mining_spread + stats[Stat::MiningSpread],
            wisdom: c.mining_wisdom + stats[Stat::MiningWisdom],
            powder_rate: 1.0
                + c.global_powder_boost
                + fiesta * c.fiesta_powder_boost
                + stats[Stat::PowderGain] / 100.0,
            pristine: c.pristine,
            titanium_chance: stats[Stat::TitaniumChance] + fiesta * c.fiesta_titanium_chance,
        };

        let material = self.material();
        match material {
            Material::Ore => {
                s.speed += c.dwarven_mines_speed + stats[Stat::OreSpeed];
                s.fortune += c.ore_fortune + stats[Stat::OreFortune];
                s.spread += c.ore_and_block_spread + c.mines_of_divan_spread;
            }
            Material::Mithril => {
                s.speed += c.mithril_speed + c.dwarven_mines_speed + stats[Stat::DwarvenMetalSpeed];
                s.fortune +=
                    c.dwarven_mines_fortune + c.dwarven_metal_fortune + stats[Stat::DwarvenMetalFortune];
            }
            Material::Titanium => {
                s.speed += c.dwarven_mines_speed + stats[Stat::DwarvenMetalSpeed];
                s.fortune += c.titanium_fortune
                    + c.dwarven_mines_fortune
                    + c.dwarven_metal_fortune
                    + stats[Stat::DwarvenMetalFortune];
            }
            Material::Amber => s.fortune += c.crystal_hollows_fortune,
            Material::Topaz => s.pristine += c.magma_fields_pristine,
            Material::Glacite => {
                s.speed += c.dwarven_mines_speed + stats[Stat::DwarvenMetalSpeed];
                s.fortune += 0.3 * c.mineshafts_fortune;
                s.spread += stats[Stat::MineshaftMiningSpread];
            }
            Material::Aquamarine => {
                s.speed += c.dwarven_mines_speed;
                s.fortune += 0.3 * c.mineshafts_fortune;
                s.spread += stats[Stat::MineshaftGemstoneSpread];
            }
            Material::Ruby | Material::Jasper | Material::Hardstone => {}
        }
        if material.is_gemstone() {
            s.speed += c.gemstone_speed + stats[Stat::GemstoneSpeed];
            if self.consider_fortune() {
                s.fortune += c.gemstone_fortune + stats[Stat::GemstoneFortune];
            }
        }
        s
    }

    /// Expected seconds per cycle spent opening treasure chests.
    fn chest_time(
        &self,
        data: &GameData,
        assignment: &Assignment,
        stats: &StatVector,
        spread: f64,
        round_ticks: bool,
    ) -> f64 {
        let c = self.config();
        let boost = c.treasure_chest_chance + stats[Stat::TreasureChestChance] / 100.0;
        let chests = (1.0 + spread / 100.0) * BASE_CHEST_CHANCE * (1.0 + boost);
        let perk_level = data
            .mining
            .chest_lock_perk()
            .map(|id| assignment.level(id))
            .unwrap_or(0);
        let locks = if perk_level == 0 {
            5.0
        } else if round_ticks {
            (4 - i64::from(perk_level / 5)) as f64
        } else {
            4.0 - f64::from(perk_level) / 5.0
        };
        chests * (locks + c.reaction_speed) + c.reaction_speed
    }
}
