//! Candidate tree assembly for the Heart of the Mountain grid.
//!
//! Given a set of nodes a player wants and a token allowance, this crate finds
//! every minimal connected selection of cells that links those nodes to the
//! entry node. The optimizer in `hotm-core` then levels each candidate.
//!
//! The work happens in three stages:
//!
//! 1. [`PathTable::build`] enumerates minimal entry paths for every cell below
//!    the unlock ceiling.
//! 2. [`union_search`] combines one path per required node into minimal
//!    covers under a size bound and hard [`SearchLimits`].
//! 3. [`PathAssembler`] wires the two together, forces the core node in when
//!    it is unlocked and checks the final token cost.
//!
//! Infeasibility is an empty result, never an error.

pub mod cells;
pub mod search;
pub mod table;

pub use cells::CellSet;
pub use search::{SearchLimits, SearchResult, union_search};
pub use table::PathTable;

use hotm_core::catalog::{NodeCatalog, NodeId};
use hotm_core::optimizer::Tree;
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// Assembly result
// ---------------------------------------------------------------------------

/// Candidate trees as cell sets, sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub trees: Vec<CellSet>,
    /// A search limit tripped; `trees` may be incomplete.
    pub truncated: bool,
}

impl Assembly {
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Resolve every cell set to a [`Tree`] of node ids.
    pub fn to_trees(&self, catalog: &NodeCatalog) -> Vec<Tree> {
        self.trees.iter().map(|&set| to_tree(catalog, set)).collect()
    }
}

pub fn to_tree(catalog: &NodeCatalog, set: CellSet) -> Tree {
    Tree::from_ids(set.iter().filter_map(|cell| catalog.at(catalog.cell_position(cell))))
}

// ---------------------------------------------------------------------------
// PathAssembler
// ---------------------------------------------------------------------------

/// Path table plus the token allowance it was built for.
pub struct PathAssembler<'a> {
    catalog: &'a NodeCatalog,
    table: PathTable,
    tokens: u32,
    limits: SearchLimits,
}

impl<'a> PathAssembler<'a> {
    /// Build the path table for `ceiling` (the HOTM level) and `tokens`.
    ///
    /// Paths are bounded by `tokens + 1` cells since the core node is free.
    pub fn new(catalog: &'a NodeCatalog, ceiling: u32, tokens: u32) -> Self {
        let max_len = tokens as usize + 1;
        Self {
            catalog,
            table: PathTable::build(catalog, ceiling, max_len),
            tokens,
            limits: SearchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn table(&self) -> &PathTable {
        &self.table
    }

    fn core_unlocked(&self) -> bool {
        u32::from(self.catalog.position(self.catalog.core()).tier) < self.table.ceiling()
    }

    /// Minimal trees that contain every node in `required`.
    #[instrument(level = "debug", skip_all, fields(required = required.len(), tokens = self.tokens))]
    pub fn assemble(&self, required: &[NodeId]) -> Assembly {
        let catalog = self.catalog;
        let mut groups: Vec<&[CellSet]> = Vec::with_capacity(required.len() + 1);
        for &id in required {
            let paths = self.table.paths(catalog, id);
            if paths.is_empty() {
                debug!(node = catalog.name(id), "no path within ceiling and budget");
                return Assembly::default();
            }
            groups.push(paths);
        }

        let core_cell = catalog.cell_index(catalog.position(catalog.core()));
        let core_unlocked = self.core_unlocked();
        if core_unlocked {
            groups.push(self.table.paths_from_cell(core_cell));
        }

        let max_len = self.tokens as usize + 1;
        let found = union_search(&groups, max_len, self.limits);

        let mut trees: Vec<CellSet> = found
            .sets
            .into_iter()
            .map(|set| if core_unlocked { set.with(core_cell) } else { set })
            .filter(|set| {
                let free = usize::from(core_unlocked && set.contains(core_cell));
                set.len() - free <= self.tokens as usize
            })
            .collect();
        trees.sort_unstable();
        trees.dedup();

        debug!(trees = trees.len(), truncated = found.truncated, "assembled");
        Assembly {
            trees,
            truncated: found.truncated,
        }
    }

    /// Trees for `nodes`, once per ability in `abilities` (each tree holds
    /// exactly one of them) or once on their own when `abilities` is empty.
    pub fn find_trees(&self, abilities: &[NodeId], nodes: &[NodeId]) -> Assembly {
        if abilities.is_empty() {
            return self.assemble(nodes);
        }

        let mut all = Assembly::default();
        for &ability in abilities {
            let mut required = nodes.to_vec();
            required.push(ability);
            let found = self.assemble(&required);
            all.trees.extend(found.trees);
            all.truncated |= found.truncated;
        }
        all.trees.sort_unstable();
        all.trees.dedup();
        if all.truncated {
            warn!(trees = all.trees.len(), "tree search truncated for at least one ability");
        }
        all
    }
}
