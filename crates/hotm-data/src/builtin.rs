//! The stock tree and mining tables, compiled into the binary.

use hotm_core::tables::GameData;
use std::path::Path;
use tracing::debug;

use crate::loader::{DataLoadError, Format, parse_str};
use crate::resolve::{build_catalog, build_tables};
use crate::schema::{LayoutData, MiningData, NodeData};

const NODES: &str = include_str!("../data/nodes.ron");
const LAYOUT: &str = include_str!("../data/layout.ron");
const MINING: &str = include_str!("../data/mining.ron");

/// Parse and resolve the built-in data set.
pub fn builtin() -> Result<GameData, DataLoadError> {
    let nodes_path = Path::new("<builtin>/nodes.ron");
    let layout_path = Path::new("<builtin>/layout.ron");
    let mining_path = Path::new("<builtin>/mining.ron");

    let nodes: Vec<NodeData> = parse_str(NODES, Format::Ron, nodes_path)?;
    let layout: LayoutData = parse_str(LAYOUT, Format::Ron, layout_path)?;
    let mining: MiningData = parse_str(MINING, Format::Ron, mining_path)?;

    let catalog = build_catalog(&nodes, &layout, nodes_path, layout_path)?;
    let mining = build_tables(mining, &catalog, mining_path)?;
    debug!(nodes = catalog.len(), "built-in game data resolved");
    Ok(GameData { catalog, mining })
}

/// Data from `dir` when given, the built-in set otherwise.
pub fn load_or_builtin(dir: Option<&Path>) -> Result<GameData, DataLoadError> {
    match dir {
        Some(dir) => crate::loader::load_game_data(dir),
        None => builtin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotm_core::catalog::{NodeKind, Position, PowderType};
    use hotm_core::profile::{Profile, ProfileConfig};
    use hotm_core::tables::Material;

    #[test]
    fn builtin_loads() {
        let data = builtin().unwrap();
        let catalog = &data.catalog;
        assert_eq!(catalog.tiers(), 10);
        assert_eq!(catalog.slots(), 7);
        assert_eq!(catalog.name(catalog.entry()), "mining_speed");
        assert_eq!(catalog.position(catalog.entry()), Position::new(0, 3));
        assert_eq!(catalog.name(catalog.core()), "core_of_the_mountain");
        assert_eq!(catalog.position(catalog.core()), Position::new(4, 3));
        assert_eq!(data.mining.chest_lock_perk(), catalog.id("great_explorer"));
    }

    #[test]
    fn builtin_powder_by_tier() {
        let data = builtin().unwrap();
        let catalog = &data.catalog;
        let powder = |name: &str| catalog.funding_currency(catalog.id(name).unwrap());
        assert_eq!(powder("mining_speed"), PowderType::Mithril);
        assert_eq!(powder("great_explorer"), PowderType::Gemstone);
        assert_eq!(powder("metal_head"), PowderType::Glacite);
    }

    #[test]
    fn builtin_tokens() {
        let data = builtin().unwrap();
        assert_eq!(data.catalog.max_hotm(), 10);
        assert_eq!(data.catalog.tokens(1, 0), Some(1));
        assert_eq!(data.catalog.tokens(10, data.catalog.max_cotm()), Some(24));
    }

    #[test]
    fn builtin_abilities() {
        let data = builtin().unwrap();
        let names: Vec<&str> = data.catalog.abilities().map(|id| data.catalog.name(id)).collect();
        assert!(names.contains(&"pickobulus"));
        assert!(names.contains(&"mining_speed_boost"));
        for id in data.catalog.abilities() {
            assert_eq!(data.catalog.node(id).kind, NodeKind::Ability);
        }
    }

    #[test]
    fn every_task_key_resolves() {
        let data = builtin().unwrap();
        let base = ProfileConfig {
            heart_of_the_mountain: 10,
            ..ProfileConfig::default()
        };
        for material in Material::ALL.into_iter().filter(|m| *m != Material::Hardstone) {
            for mode in ["ores", "exp"] {
                let config = ProfileConfig {
                    mode: mode.to_string(),
                    ore: Some(material.name().to_string()),
                    use_titanium: material == Material::Titanium,
                    ..base.clone()
                };
                assert!(Profile::new(config, &data).is_ok(), "{mode} {material}");
            }
        }
        for powder in ["mithril", "gemstone", "glacite"] {
            for consider_fortune in [true, false] {
                let config = ProfileConfig {
                    mode: "powder".to_string(),
                    powder_type: Some(powder.to_string()),
                    consider_fortune,
                    ..base.clone()
                };
                assert!(Profile::new(config, &data).is_ok(), "powder {powder}");
            }
        }
        let titanium = ProfileConfig {
            mode: "powder".to_string(),
            powder_type: Some("mithril".to_string()),
            ore: Some("titanium".to_string()),
            use_titanium: true,
            ..base
        };
        assert!(Profile::new(titanium, &data).is_ok());
    }
}
