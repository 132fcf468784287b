//! HOTM Core -- evaluation and powder allocation for the Heart of the
//! Mountain tree.
//!
//! This crate answers one question: given a player's stats and powder
//! balances, which nodes of a fixed tree should be leveled, and how far, to
//! maximize the per-minute yield of a chosen resource?
//!
//! # Pipeline
//!
//! 1. **Catalog** -- [`catalog::NodeCatalog`] holds the immutable tree: node
//!    positions, effects, funding powder and cost curves.
//! 2. **Profile** -- [`profile::Profile::new`] validates a raw
//!    [`profile::ProfileConfig`] once. Nothing downstream re-checks it.
//! 3. **Evaluation** -- [`profile::Profile::evaluate`] scores an
//!    [`assignment::Assignment`] in units per minute.
//! 4. **Optimization** -- [`optimizer::Optimizer`] greedily buys the level
//!    with the best score gain per powder until nothing is affordable.
//!
//! # Key Types
//!
//! - [`stat::StatVector`] -- fixed slot-per-stat accumulator.
//! - [`tables::GameData`] -- catalog plus block and task tables.
//! - [`assignment::Assignment`] -- immutable node level map.
//! - [`optimizer::Outcome`] -- final levels, leftover powder and score.

pub mod assignment;
pub mod catalog;
pub mod eval;
pub mod optimizer;
pub mod profile;
pub mod stat;
pub mod tables;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
