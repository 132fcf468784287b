//! Property-based tests for evaluation, the greedy optimizer and path
//! assembly.
//!
//! Uses proptest to generate random assignments, balances and requirement
//! sets over the fixture tree, then verify the invariants hold.

use hotm_core::assignment::Assignment;
use hotm_core::catalog::NodeId;
use hotm_core::optimizer::{Optimizer, OptimizerOptions, Tree};
use hotm_core::profile::{Profile, ProfileConfig};
use hotm_core::test_utils::*;
use hotm_path::{PathAssembler, to_tree};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

const ORE_NODES: [&str; 3] = ["speed_drill", "fortune_drill", "spread_drill"];

/// Every task the fixture can score, each with the nodes that feed it.
/// Spread is left out of gemstone powder, where it only adds chest time.
fn task_cases() -> Vec<(ProfileConfig, Vec<&'static str>)> {
    let mut exp = ores_config("ore");
    exp.mode = "exp".to_string();
    exp.mining_wisdom = 50.0;
    let mut titanium = ores_config("titanium");
    titanium.use_titanium = true;
    vec![
        (ores_config("ore"), ORE_NODES.to_vec()),
        (exp, ORE_NODES.to_vec()),
        (
            ores_config("ruby"),
            vec!["speed_drill", "fortune_drill", "gem_finder", "spread_drill", "gem_speed"],
        ),
        (titanium, vec!["speed_drill", "titanium_sense", "fortune_drill", "spread_drill"]),
        (
            powder_config("mithril"),
            vec!["speed_drill", "spread_drill", "mithril_boost", "powder_gain"],
        ),
        (powder_config("gemstone"), vec!["speed_drill", "powder_gain", "chest_seeker"]),
        (
            powder_config("glacite"),
            vec!["speed_drill", "cold_grip", "spread_drill", "powder_gain"],
        ),
    ]
}

/// A task, levels in `1..max` for up to five of its nodes and the node to
/// bump.
fn arb_task_levels() -> impl Strategy<Value = (usize, Vec<u32>, prop::sample::Index)> {
    // gem_speed and cold_grip cap at 10
    (
        0..task_cases().len(),
        proptest::collection::vec(1..10u32, 5),
        any::<prop::sample::Index>(),
    )
}

/// A non-empty set of fixture node names.
fn arb_required() -> impl Strategy<Value = Vec<String>> {
    let names = all_node_names(&test_catalog());
    proptest::sample::subsequence(names, 1..=3)
}

fn ids(names: &[&str]) -> Vec<NodeId> {
    let catalog = test_catalog();
    names.iter().map(|n| catalog.id(n).unwrap()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // =======================================================================
    // Evaluation
    // =======================================================================

    #[test]
    fn one_more_level_never_lowers_score(
        (task, levels, bump) in arb_task_levels(),
        round_ticks in any::<bool>(),
        consider_fortune in any::<bool>(),
    ) {
        let data = test_data();
        let (mut config, names) = task_cases().swap_remove(task);
        config.round_ticks = round_ticks;
        config.consider_fortune = consider_fortune;
        let profile = Profile::new(config, &data).unwrap();

        let nodes = ids(&names);
        let mut assignment = Assignment::new();
        for (&id, &level) in nodes.iter().zip(&levels) {
            assignment = assignment.with_level(id, level);
        }
        let bumped = assignment.apply(*bump.get(&nodes));
        let before = profile.search_score(&data, &assignment);
        let after = profile.search_score(&data, &bumped);
        prop_assert!(after >= before, "{}: {} < {}", task, after, before);
    }

    // =======================================================================
    // Optimizer
    // =======================================================================

    #[test]
    fn optimizer_is_deterministic(mithril in 0..200_000u64, gemstone in 0..200_000u64) {
        let data = test_data();
        let profile = Profile::new(funded(powder_config("gemstone"), mithril, gemstone, 0), &data).unwrap();
        let tree = Tree::from_names(
            &data.catalog,
            ["speed_drill", "fortune_drill", "gem_finder", "core", "chest_seeker", "powder_gain"],
        )
        .unwrap();

        let a = Optimizer::new(&data, &profile).optimize(&tree).unwrap();
        let b = Optimizer::new(&data, &profile).optimize(&tree).unwrap();
        prop_assert_eq!(&a.assignment, &b.assignment);
        prop_assert_eq!(a.budget, b.budget);
        prop_assert_eq!(a.purchases, b.purchases);
        prop_assert_eq!(a.per_minute().to_bits(), b.per_minute().to_bits());
    }

    #[test]
    fn balances_never_go_negative_and_only_fall(mithril in 0..100_000u64) {
        let data = test_data();
        let profile = Profile::new(funded(ores_config("ore"), mithril, 0, 0), &data).unwrap();
        let tree = Tree::from_names(&data.catalog, ORE_NODES).unwrap();

        let outcome = Optimizer::new(&data, &profile).optimize(&tree).unwrap();
        prop_assert!(outcome.budget.mithril <= mithril);
        let baseline = profile.score(&data, &Assignment::selected(tree.iter()));
        prop_assert!(outcome.per_minute() >= baseline);
    }

    #[test]
    fn rounded_scores_never_stop_the_optimizer(
        task in 0..task_cases().len(),
        mithril in 0..50_000u64,
        gemstone in 0..50_000u64,
        glacite in 0..50_000u64,
    ) {
        let data = test_data();
        let (config, names) = task_cases().swap_remove(task);
        let mut config = funded(config, mithril, gemstone, glacite);
        config.round_ticks = true;
        let profile = Profile::new(config, &data).unwrap();
        // the extra nodes link each task's nodes to the entry
        let linked = names.into_iter().chain(["titanium_sense", "core", "gem_finder", "powder_gain"]);
        let tree = Tree::from_names(&data.catalog, linked).unwrap();
        prop_assert!(tree.is_connected(&data.catalog));

        let outcome = Optimizer::new(&data, &profile).optimize(&tree);
        prop_assert!(outcome.is_ok(), "{}: {:?}", task, outcome.as_ref().err());
        let outcome = outcome.unwrap();
        prop_assert_eq!(outcome.per_minute(), profile.score(&data, &outcome.assignment));
    }

    #[test]
    fn fast_path_agrees_with_step_loop(gemstone in 10_000_000..100_000_000u64) {
        let data = test_data();
        let profile = Profile::new(funded(powder_config("gemstone"), 0, gemstone, 0), &data).unwrap();
        let tree = Tree::from_names(
            &data.catalog,
            ["speed_drill", "fortune_drill", "gem_finder", "core", "chest_seeker"],
        )
        .unwrap();

        let fast = Optimizer::new(&data, &profile).optimize(&tree).unwrap();
        let slow = Optimizer::new(&data, &profile)
            .with_options(OptimizerOptions { fast_path: false })
            .optimize(&tree)
            .unwrap();
        prop_assert_eq!(&fast.assignment, &slow.assignment);
    }

    // =======================================================================
    // Path assembly
    // =======================================================================

    #[test]
    fn assembled_trees_are_minimal_and_fit(
        required in arb_required(),
        ceiling in 1..=5u32,
        tokens in 1..=12u32,
    ) {
        let catalog = test_catalog();
        let required: Vec<NodeId> = required.iter().map(|n| catalog.id(n).unwrap()).collect();
        let assembler = PathAssembler::new(&catalog, ceiling, tokens);
        let found = assembler.assemble(&required);
        prop_assert!(!found.truncated);

        for (i, &a) in found.trees.iter().enumerate() {
            for &b in &found.trees[i + 1..] {
                prop_assert!(!a.is_strict_subset(b) && !b.is_strict_subset(a));
            }
            let tree = to_tree(&catalog, a);
            prop_assert!(tree.is_connected(&catalog));
            prop_assert!(tree.token_cost(&catalog) <= tokens as usize);
            for &id in &required {
                prop_assert!(tree.contains(id));
                prop_assert!(u32::from(catalog.position(id).tier) < ceiling);
            }
        }
    }
}
