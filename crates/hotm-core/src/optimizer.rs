//! Greedy powder allocation over a fixed tree.
//!
//! The optimizer starts every node of the tree at level 1 and then keeps
//! buying the single level with the best score gain per powder spent, until
//! no optimizable node is both below max level and affordable. This is a
//! heuristic: cross terms between speed, fortune and spread mean the greedy
//! order is not guaranteed to reach the global optimum.
//!
//! Candidates are visited in lexicographic node-name order and a candidate
//! only replaces the current best on a strictly greater ratio, so ties always
//! go to the name that sorts first. With the `parallel` feature the ratios are
//! computed on the rayon pool and reduced in that same order.

use crate::assignment::{Assignment, Budget};
use crate::catalog::{CatalogError, NodeCatalog, NodeId, PowderType};
use crate::eval::ScoreResult;
use crate::profile::{ConfigError, Profile};
use crate::stat::Stat;
use crate::tables::GameData;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("cannot level up node that is not selected: {0:?}")]
    InvalidState(String),

    #[error("best purchase {node:?} hurts the score ({ratio} per powder)")]
    InvariantViolation { node: Option<String>, ratio: f64 },
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// The set of unlocked nodes. Shape only; levels live in an [`Assignment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tree(BTreeSet<NodeId>);

impl Tree {
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Resolve node names. Unknown names are a configuration error.
    pub fn from_names<S: AsRef<str>>(
        catalog: &NodeCatalog,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                catalog
                    .id(name)
                    .ok_or_else(|| ConfigError::UnknownNode(name.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens the tree spends. The core is free.
    pub fn token_cost(&self, catalog: &NodeCatalog) -> usize {
        self.iter().filter(|&id| id != catalog.core()).count()
    }

    /// Whether every node reaches the entry node through tree nodes.
    pub fn is_connected(&self, catalog: &NodeCatalog) -> bool {
        let entry = catalog.entry();
        if self.is_empty() {
            return true;
        }
        if !self.contains(entry) {
            return false;
        }
        let mut seen = HashSet::from([entry]);
        let mut queue = VecDeque::from([entry]);
        while let Some(id) = queue.pop_front() {
            for next in catalog.neighbors(id) {
                if self.contains(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen.len() == self.len()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one optimization run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub tree: Tree,
    pub assignment: Assignment,
    /// Powder left after all purchases.
    pub budget: Budget,
    /// Final evaluation, tick rounded when the profile asks for it. The
    /// purchases themselves are chosen on unrounded scores.
    pub score: ScoreResult,
    /// Final level of every optimizable node, in catalog order.
    pub invested: Vec<(NodeId, u32)>,
    pub relevant_stats: Vec<Stat>,
    /// Tree nodes touching a relevant stat, in catalog order.
    pub significant: Vec<NodeId>,
    /// Leveled significant nodes, in tie-break order.
    pub optimizable: Vec<NodeId>,
    /// Currencies whose nodes were maxed without stepping.
    pub fast_path: Vec<PowderType>,
    pub purchases: usize,
}

impl Outcome {
    pub fn per_minute(&self) -> f64 {
        self.score.per_minute
    }

    pub fn per_hour(&self) -> f64 {
        self.score.per_hour()
    }

    /// Time to collect `amount` units at the final rate, floored to whole
    /// seconds. `None` when the rate is zero.
    pub fn time_to_target(&self, amount: f64) -> Option<Duration> {
        if self.per_minute() <= 0.0 {
            return None;
        }
        let seconds = (amount / self.per_minute() * 60.0).floor();
        (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs(seconds as u64))
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerOptions {
    /// Max every node of a currency at once when the balance covers all of
    /// them.
    pub fast_path: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self { fast_path: true }
    }
}

/// A purchasable level: node, funding powder and price.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: NodeId,
    powder: PowderType,
    cost: u64,
}

/// Owns the assignment and budget of one run.
#[derive(Debug)]
pub struct Optimizer<'a> {
    data: &'a GameData,
    profile: &'a Profile,
    options: OptimizerOptions,
    assignment: Assignment,
    budget: Budget,
}

impl<'a> Optimizer<'a> {
    pub fn new(data: &'a GameData, profile: &'a Profile) -> Self {
        Self {
            data,
            profile,
            options: OptimizerOptions::default(),
            assignment: Assignment::new(),
            budget: profile.budget(),
        }
    }

    pub fn with_options(mut self, options: OptimizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Check tier locks and the token allowance. A tree that does not reach
    /// the entry node is suspicious but allowed.
    pub fn validate_tree(&self, tree: &Tree) -> Result<(), ConfigError> {
        let catalog = &self.data.catalog;
        let hotm = self.profile.hotm();
        for id in tree.iter() {
            let tier = catalog.position(id).tier;
            if u32::from(tier) >= hotm {
                return Err(ConfigError::TierLocked {
                    node: catalog.name(id).to_string(),
                    tier,
                    hotm,
                });
            }
        }
        let needed = tree.token_cost(catalog);
        if needed > self.profile.tokens() as usize {
            return Err(ConfigError::TokenBudgetExceeded {
                needed,
                available: self.profile.tokens(),
            });
        }
        if !tree.is_connected(catalog) {
            warn!("tree is not connected to {}", catalog.name(catalog.entry()));
        }
        Ok(())
    }

    /// Funding powder and price of the next level of `id`.
    pub fn cost_of(&self, id: NodeId) -> Result<(PowderType, u64), OptimizeError> {
        let catalog = &self.data.catalog;
        let level = self.assignment.level(id);
        if level == 0 {
            return Err(OptimizeError::InvalidState(catalog.name(id).to_string()));
        }
        Ok((catalog.funding_currency(id), catalog.cost_of(id, level)?))
    }

    /// Whether the next level of `id` exists and fits the budget.
    pub fn can_afford(&self, id: NodeId) -> Result<bool, OptimizeError> {
        let catalog = &self.data.catalog;
        let level = self.assignment.level(id);
        if level == 0 {
            return Err(OptimizeError::InvalidState(catalog.name(id).to_string()));
        }
        let max = catalog
            .max_level(id)
            .ok_or_else(|| CatalogError::NotLeveled(catalog.name(id).to_string()))?;
        if level >= max {
            return Ok(false);
        }
        let (powder, cost) = self.cost_of(id)?;
        Ok(self.budget.can_afford(powder, cost))
    }

    /// Optimize `tree` from the profile's starting balances.
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn optimize(&mut self, tree: &Tree) -> Result<Outcome, OptimizeError> {
        self.validate_tree(tree)?;
        let data = self.data;
        let catalog = &data.catalog;
        let relevant: HashSet<Stat> = self.profile.relevant_stats().iter().copied().collect();

        let significant: Vec<NodeId> = catalog
            .row_major()
            .iter()
            .copied()
            .filter(|&id| tree.contains(id))
            .filter(|&id| catalog.node_stats(id).iter().any(|s| relevant.contains(s)))
            .collect();
        let mut optimizable: Vec<NodeId> = significant
            .iter()
            .copied()
            .filter(|&id| catalog.is_leveled(id))
            .collect();
        optimizable.sort_by(|&a, &b| catalog.name(a).cmp(catalog.name(b)));
        info!(
            relevant = ?self.profile.relevant_stats(),
            significant = ?names(catalog, &significant),
            optimizable = ?names(catalog, &optimizable),
            "starting optimization"
        );

        self.assignment = Assignment::selected(tree.iter());
        self.budget = self.profile.budget();

        let fast_path = if self.options.fast_path {
            self.max_affordable_currencies(&optimizable)?
        } else {
            Vec::new()
        };

        let mut purchases = 0;
        loop {
            let candidates = self.candidates(&optimizable)?;
            if candidates.is_empty() {
                break;
            }
            let current = self.profile.search_score(data, &self.assignment);
            let ratios = self.ratios(current, &candidates);

            let mut best: Option<(usize, f64)> = None;
            for (i, &ratio) in ratios.iter().enumerate() {
                if ratio > best.map_or(f64::NEG_INFINITY, |(_, r)| r) {
                    best = Some((i, ratio));
                }
            }
            let (index, ratio) = match best {
                Some((i, r)) if r >= 0.0 => (i, r),
                other => {
                    return Err(OptimizeError::InvariantViolation {
                        node: other.map(|(i, _)| catalog.name(candidates[i].id).to_string()),
                        ratio: other.map_or(f64::NAN, |(_, r)| r),
                    });
                }
            };

            let pick = candidates[index];
            self.assignment = self.assignment.apply(pick.id);
            let debited = self.budget.debit(pick.powder, pick.cost);
            debug_assert!(debited, "candidate was affordable");
            purchases += 1;
            debug!(
                node = catalog.name(pick.id),
                level = self.assignment.level(pick.id),
                cost = pick.cost,
                powder = %pick.powder,
                ratio,
                "purchase"
            );
        }

        let score = self.profile.evaluate(data, &self.assignment);
        let invested = catalog
            .row_major()
            .iter()
            .copied()
            .filter(|id| optimizable.contains(id))
            .map(|id| (id, self.assignment.level(id)))
            .collect();
        info!(
            purchases,
            per_minute = score.per_minute,
            mithril = self.budget.mithril,
            gemstone = self.budget.gemstone,
            glacite = self.budget.glacite,
            "optimization finished"
        );

        Ok(Outcome {
            tree: tree.clone(),
            assignment: self.assignment.clone(),
            budget: self.budget,
            score,
            invested,
            relevant_stats: self.profile.relevant_stats().to_vec(),
            significant,
            optimizable,
            fast_path,
            purchases,
        })
    }

    /// Max out every currency whose balance covers the full cost of all the
    /// nodes it funds. The full cumulative cost from level 0 is debited.
    fn max_affordable_currencies(&mut self, optimizable: &[NodeId]) -> Result<Vec<PowderType>, OptimizeError> {
        let data = self.data;
        let catalog = &data.catalog;
        let mut maxed = Vec::new();
        for powder in PowderType::ALL {
            let nodes: Vec<NodeId> = optimizable
                .iter()
                .copied()
                .filter(|&id| catalog.funding_currency(id) == powder)
                .collect();
            if nodes.is_empty() {
                continue;
            }
            let mut total = 0u64;
            for &id in &nodes {
                let table = catalog.cumulative_cost(id)?;
                total = total.saturating_add(table.last().copied().unwrap_or(0));
            }
            if total > self.budget.get(powder) {
                continue;
            }
            for &id in &nodes {
                let max = catalog.cumulative_cost(id)?.len() as u32 - 1;
                self.assignment = self.assignment.with_level(id, max);
            }
            self.budget.debit(powder, total);
            info!(%powder, total, nodes = nodes.len(), "balance covers every node, maxing");
            maxed.push(powder);
        }
        Ok(maxed)
    }

    fn candidates(&self, optimizable: &[NodeId]) -> Result<Vec<Candidate>, OptimizeError> {
        let mut out = Vec::new();
        for &id in optimizable {
            if self.can_afford(id)? {
                let (powder, cost) = self.cost_of(id)?;
                out.push(Candidate { id, powder, cost });
            }
        }
        Ok(out)
    }

    fn ratio(&self, current: f64, candidate: &Candidate) -> f64 {
        let next = self.assignment.apply(candidate.id);
        (self.profile.search_score(self.data, &next) - current) / candidate.cost as f64
    }

    #[cfg(not(feature = "parallel"))]
    fn ratios(&self, current: f64, candidates: &[Candidate]) -> Vec<f64> {
        candidates.iter().map(|c| self.ratio(current, c)).collect()
    }

    #[cfg(feature = "parallel")]
    fn ratios(&self, current: f64, candidates: &[Candidate]) -> Vec<f64> {
        use rayon::prelude::*;
        candidates.par_iter().map(|c| self.ratio(current, c)).collect()
    }
}

fn names<'c>(catalog: &'c NodeCatalog, ids: &[NodeId]) -> Vec<&'c str> {
    ids.iter().map(|&id| catalog.name(id)).collect()
}
