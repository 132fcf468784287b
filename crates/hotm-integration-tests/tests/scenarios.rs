//! End-to-end scenarios across the evaluation engine, the optimizer and the
//! path assembler, run against the shared 5x3 fixture tree.

use hotm_core::assignment::Assignment;
use hotm_core::catalog::{NodeCatalog, NodeCatalogBuilder, NodeDef, Position, PowderType};
use hotm_core::optimizer::{OptimizeError, Optimizer, Tree};
use hotm_core::profile::Profile;
use hotm_core::tables::Material;
use hotm_core::test_utils::*;
use hotm_path::PathAssembler;

fn tree(names: &[&str]) -> Tree {
    Tree::from_names(&test_catalog(), names).unwrap()
}

// ===========================================================================
// Optimizer
// ===========================================================================

#[test]
fn titanium_chase_without_powder_keeps_baseline() {
    let data = test_data();
    let mut config = powder_config("mithril");
    config.use_titanium = true;
    config.fiesta_titanium_chance = 5.0;
    let profile = Profile::new(config, &data).unwrap();
    assert_eq!(profile.material(), Material::Titanium);

    let t = tree(&["speed_drill", "fortune_drill", "titanium_sense", "core"]);
    let outcome = Optimizer::new(&data, &profile).optimize(&t).unwrap();

    assert_eq!(outcome.purchases, 0);
    assert!(outcome.fast_path.is_empty());
    let baseline = profile.score(&data, &Assignment::selected(t.iter()));
    assert_eq!(outcome.per_minute(), baseline);
    for (_, level) in &outcome.invested {
        assert_eq!(*level, 1);
    }
}

#[test]
fn exact_balance_maxes_single_node() {
    let data = single_node_data();
    let drill = data.catalog.id("drill").unwrap();
    assert_eq!(data.catalog.cumulative_cost(drill).unwrap(), &[0, 4]);

    let mut config = funded(ores_config("ore"), 4, 0, 0);
    config.heart_of_the_mountain = 1;
    config.core_of_the_mountain = 0;
    let profile = Profile::new(config, &data).unwrap();
    let outcome = Optimizer::new(&data, &profile)
        .optimize(&Tree::from_ids([drill]))
        .unwrap();

    assert_eq!(outcome.fast_path, vec![PowderType::Mithril]);
    assert_eq!(outcome.assignment.level(drill), 1);
    assert_eq!(outcome.budget.get(PowderType::Mithril), 0);
    assert_eq!(outcome.purchases, 0);
}

#[test]
fn cost_of_unselected_node_is_invalid_state() {
    let data = test_data();
    let profile = Profile::new(ores_config("ore"), &data).unwrap();
    let optimizer = Optimizer::new(&data, &profile);
    let fortune = data.catalog.id("fortune_drill").unwrap();

    assert!(matches!(
        optimizer.cost_of(fortune),
        Err(OptimizeError::InvalidState(ref name)) if name == "fortune_drill"
    ));
    assert!(matches!(optimizer.can_afford(fortune), Err(OptimizeError::InvalidState(_))));
}

// ===========================================================================
// Path assembly
// ===========================================================================

#[test]
fn node_above_ceiling_has_no_tree() {
    let catalog = test_catalog();
    let gem_speed = catalog.id("gem_speed").unwrap();
    let mithril_boost = catalog.id("mithril_boost").unwrap();

    // tiers 0..=2 unlocked
    let assembler = PathAssembler::new(&catalog, 3, 20);
    assert!(assembler.assemble(&[gem_speed]).is_empty());
    assert!(assembler.assemble(&[mithril_boost]).is_empty());
    assert!(assembler.table().paths(&catalog, gem_speed).is_empty());
}

/// 3x3 grid where `ledge` (tier 1) is only reachable over tier 2:
///
/// ```text
/// 2  ridge   core  crest
/// 1  burst   .     ledge
/// 0  root    .     .
/// ```
fn detour_catalog() -> NodeCatalog {
    let mut b = NodeCatalogBuilder::new(3, 3);
    b.tier_powder(vec![PowderType::Mithril; 3])
        .token_tables(vec![1, 5, 10], vec![0])
        .entry("root")
        .core("core");
    let p = Position::new;
    b.register(NodeDef::misc("root", p(0, 0), Vec::new()));
    b.register(NodeDef::ability("burst", p(1, 0), Vec::new()));
    b.register(NodeDef::misc("ledge", p(1, 2), Vec::new()));
    b.register(NodeDef::misc("ridge", p(2, 0), Vec::new()));
    b.register(NodeDef::misc("core", p(2, 1), Vec::new()));
    b.register(NodeDef::misc("crest", p(2, 2), Vec::new()));
    b.build().unwrap()
}

#[test]
fn unlocked_node_behind_locked_tier_has_no_tree() {
    let catalog = detour_catalog();
    let ledge = catalog.id("ledge").unwrap();
    let burst = catalog.id("burst").unwrap();

    // tiers 0..=1 unlocked; ledge itself sits below the ceiling
    let assembler = PathAssembler::new(&catalog, 2, 10);
    assert!(assembler.table().paths(&catalog, ledge).is_empty());
    assert!(assembler.assemble(&[ledge]).is_empty());
    assert!(assembler.find_trees(&[], &[ledge]).is_empty());
    assert!(assembler.find_trees(&[burst], &[ledge]).is_empty());
    // the ability alone is reachable
    assert!(!assembler.find_trees(&[burst], &[]).is_empty());

    // unlocking tier 2 opens the detour
    let assembler = PathAssembler::new(&catalog, 3, 10);
    let found = assembler.find_trees(&[burst], &[ledge]);
    let expected = Tree::from_names(&catalog, ["root", "burst", "ridge", "core", "crest", "ledge"]).unwrap();
    assert_eq!(found.to_trees(&catalog), vec![expected]);
}

#[test]
fn assembled_trees_feed_the_optimizer() {
    let data = test_data();
    let profile = Profile::new(funded(ores_config("ore"), 50_000, 0, 0), &data).unwrap();
    let required = [data.catalog.id("fortune_drill").unwrap()];

    let found = PathAssembler::new(&data.catalog, profile.hotm(), profile.tokens()).assemble(&required);
    assert!(!found.is_empty());
    assert!(!found.truncated);

    let mut best = f64::NEG_INFINITY;
    for t in found.to_trees(&data.catalog) {
        assert!(t.is_connected(&data.catalog));
        let outcome = Optimizer::new(&data, &profile).optimize(&t).unwrap();
        assert!(outcome.per_minute() >= 0.0);
        best = best.max(outcome.per_minute());
    }
    assert!(best > 0.0);
}
