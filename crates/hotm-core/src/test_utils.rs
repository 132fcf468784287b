//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`. The fixture tree
//! is a small 5x3 grid laid out like this (top tier first):
//!
//! ```text
//! 4  gem_speed      cold_grip       double_titanium
//! 3  powder_gain    spread_drill    mithril_boost
//! 2  gem_finder     core            chest_seeker
//! 1  fortune_drill  titanium_sense  boost_burst
//! 0  .              speed_drill     .
//! ```

use crate::catalog::{Effect, NodeCatalog, NodeCatalogBuilder, NodeDef, Position, PowderType};
use crate::profile::ProfileConfig;
use crate::stat::Stat;
use crate::tables::{BlockDef, GameData, Material, MiningTables};
use std::collections::HashMap;

// ===========================================================================
// Catalog
// ===========================================================================

pub fn test_catalog() -> NodeCatalog {
    let mut b = NodeCatalogBuilder::new(5, 3);
    b.tier_powder(vec![
        PowderType::Mithril,
        PowderType::Mithril,
        PowderType::Gemstone,
        PowderType::Gemstone,
        PowderType::Glacite,
    ])
    .token_tables(vec![1, 3, 5, 7, 10], vec![0, 1, 2])
    .entry("speed_drill")
    .core("core");

    let p = Position::new;
    b.register(NodeDef::stat("speed_drill", p(0, 1), Stat::MiningSpeed, 20.0, 20.0, 50, 1, 3.0));
    b.register(NodeDef::stat("fortune_drill", p(1, 0), Stat::MiningFortune, 5.0, 5.0, 50, 1, 3.05));
    b.register(NodeDef::stat("titanium_sense", p(1, 1), Stat::TitaniumChance, 2.0, 1.0, 50, 1, 3.1));
    b.register(NodeDef::ability("boost_burst", p(1, 2), vec![Stat::MiningSpeed]));
    b.register(NodeDef::stat("gem_finder", p(2, 0), Stat::GemstoneFortune, 4.0, 4.0, 20, 1, 2.6));
    b.register(NodeDef::misc("core", p(2, 1), Vec::new()));
    b.register(NodeDef::stat("chest_seeker", p(2, 2), Stat::TreasureChestChance, 20.0, 4.0, 20, 1, 4.0));
    b.register(NodeDef::stat("powder_gain", p(3, 0), Stat::PowderGain, 1.0, 1.0, 50, 1, 3.2));
    b.register(NodeDef::stat("spread_drill", p(3, 1), Stat::MiningSpread, 0.0, 0.5, 20, 1, 2.5));
    b.register(NodeDef::stat("mithril_boost", p(3, 2), Stat::MithrilPowder, 1.0, 1.0, 20, 1, 2.5));
    b.register(NodeDef::stat("gem_speed", p(4, 0), Stat::GemstoneSpeed, 10.0, 10.0, 10, 1, 2.2));
    b.register(NodeDef::stat("cold_grip", p(4, 1), Stat::GlacitePowder, 2.0, 2.0, 10, 1, 2.2));
    b.register(NodeDef::misc(
        "double_titanium",
        p(4, 2),
        vec![Effect::Flat {
            stat: Stat::TitaniumDrop,
            value: 2.0,
        }],
    ));

    // Fixture data is well formed.
    b.build().unwrap()
}

/// Names of every fixture node, in row-major order.
pub fn all_node_names(catalog: &NodeCatalog) -> Vec<String> {
    catalog
        .row_major()
        .iter()
        .map(|&id| catalog.name(id).to_string())
        .collect()
}

// ===========================================================================
// Mining tables
// ===========================================================================

pub fn test_blocks() -> HashMap<String, BlockDef> {
    let block = |strength: f64| BlockDef {
        strength,
        drops: 1.0,
        amplified_drops: None,
    };
    let mut blocks = HashMap::new();
    blocks.insert(
        "ore".to_string(),
        BlockDef {
            amplified_drops: Some(1.8),
            ..block(600.0)
        },
    );
    for (material, strength) in [
        (Material::Mithril, 1500.0),
        (Material::Titanium, 2000.0),
        (Material::Glacite, 6000.0),
        (Material::Ruby, 2300.0),
        (Material::Amber, 3000.0),
        (Material::Topaz, 3800.0),
        (Material::Jasper, 4800.0),
        (Material::Aquamarine, 5200.0),
        (Material::Hardstone, 50.0),
    ] {
        blocks.insert(material.block_name().to_string(), block(strength));
    }
    blocks
}

pub fn test_task_stats() -> HashMap<String, Vec<Stat>> {
    use Stat::*;
    let gem = vec![MiningSpeed, MiningFortune, GemstoneFortune, GemstoneSpeed, MiningSpread];
    let mut tasks: HashMap<String, Vec<Stat>> = [
        ("ore", vec![MiningSpeed, MiningFortune, OreFortune, OreSpeed, MiningSpread]),
        ("mithril", vec![MiningSpeed, MiningFortune, DwarvenMetalSpeed, MiningSpread, MithrilPowder]),
        (
            "titanium",
            vec![MiningSpeed, MiningFortune, TitaniumChance, TitaniumDrop, DwarvenMetalSpeed, MiningSpread],
        ),
        ("glacite", vec![MiningSpeed, MiningFortune, GlacitePowder, MineshaftMiningSpread, MiningSpread]),
        ("gemstone", vec![MiningSpeed, MiningFortune, GemstonePowder, TreasureChestChance, MiningSpread]),
        ("mithril_powder", vec![MiningSpeed, MithrilPowder, PowderGain, MiningSpread]),
        ("gemstone_powder", vec![MiningSpeed, GemstonePowder, PowderGain, TreasureChestChance, MiningSpread]),
        ("glacite_powder", vec![MiningSpeed, GlacitePowder, PowderGain, MiningSpread]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for name in ["ruby", "amber", "topaz", "jasper", "aquamarine"] {
        tasks.insert(name.to_string(), gem.clone());
    }
    tasks
}

pub fn test_compact_chances() -> Vec<f64> {
    vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
}

pub fn test_tables(catalog: &NodeCatalog) -> MiningTables {
    MiningTables::new(
        test_blocks(),
        test_compact_chances(),
        test_task_stats(),
        catalog.id("chest_seeker"),
    )
    .unwrap()
}

pub fn test_data() -> GameData {
    let catalog = test_catalog();
    let mining = test_tables(&catalog);
    GameData { catalog, mining }
}

/// Two-cell tree: one leveled mining speed node (max level 1, pad 1,
/// exponent 2, mithril) under the core.
pub fn single_node_data() -> GameData {
    let mut b = NodeCatalogBuilder::new(2, 1);
    b.tier_powder(vec![PowderType::Mithril, PowderType::Mithril])
        .token_tables(vec![1, 1], vec![0])
        .entry("drill")
        .core("core");
    b.register(NodeDef::stat(
        "drill",
        Position::new(0, 0),
        Stat::MiningSpeed,
        100.0,
        100.0,
        1,
        1,
        2.0,
    ));
    b.register(NodeDef::misc("core", Position::new(1, 0), Vec::new()));
    let catalog = b.build().unwrap();
    let mining = MiningTables::new(test_blocks(), test_compact_chances(), test_task_stats(), None).unwrap();
    GameData { catalog, mining }
}

// ===========================================================================
// Configurations
// ===========================================================================

/// Ores mode with every tier unlocked and no powder.
pub fn ores_config(ore: &str) -> ProfileConfig {
    ProfileConfig {
        mining_speed: 1000.0,
        mining_fortune: 100.0,
        heart_of_the_mountain: 5,
        core_of_the_mountain: 2,
        mode: "ores".to_string(),
        ore: Some(ore.to_string()),
        ..ProfileConfig::default()
    }
}

/// Powder mode for `powder_type` with every tier unlocked and no powder.
pub fn powder_config(powder_type: &str) -> ProfileConfig {
    ProfileConfig {
        mining_speed: 1000.0,
        mining_fortune: 100.0,
        heart_of_the_mountain: 5,
        core_of_the_mountain: 2,
        mode: "powder".to_string(),
        powder_type: Some(powder_type.to_string()),
        ..ProfileConfig::default()
    }
}

/// `config` with generous powder balances.
pub fn funded(mut config: ProfileConfig, mithril: u64, gemstone: u64, glacite: u64) -> ProfileConfig {
    config.mithril_powder = mithril;
    config.gemstone_powder = gemstone;
    config.glacite_powder = glacite;
    config
}
