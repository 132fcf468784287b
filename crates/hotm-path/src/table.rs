use crate::cells::{CellSet, minimal_sets};
use hotm_core::catalog::{NodeCatalog, NodeId};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument};

/// Every minimal path from each reachable cell down to the entry node.
///
/// Built once per unlock ceiling. A path is stored as the set of cells it
/// visits, entry included. Only cells in tiers below the ceiling are walked.
#[derive(Debug, Clone)]
pub struct PathTable {
    ceiling: u32,
    max_len: usize,
    entry: usize,
    paths: HashMap<usize, Vec<CellSet>>,
}

impl PathTable {
    /// Enumerate paths for every traversable cell, bottom tier first.
    ///
    /// Cells are solved in row-major order. While expanding from a cell, a
    /// step onto an already solved cell splices in that cell's paths instead
    /// of walking further. Paths longer than `max_len` cells are dropped.
    #[instrument(level = "debug", skip_all, fields(ceiling = ceiling, max_len = max_len))]
    pub fn build(catalog: &NodeCatalog, ceiling: u32, max_len: usize) -> Self {
        let entry = catalog.cell_index(catalog.position(catalog.entry()));
        let walkable = |id: NodeId| u32::from(catalog.position(id).tier) < ceiling;

        // Full enumeration per cell, kept for splicing. The published table is
        // reduced to minimal sets afterwards.
        let mut solved: HashMap<usize, Vec<CellSet>> = HashMap::new();
        if walkable(catalog.entry()) && max_len > 0 {
            solved.insert(entry, vec![CellSet::single(entry)]);
        }

        for &start in catalog.row_major() {
            let start_cell = catalog.cell_index(catalog.position(start));
            if !walkable(start) || solved.contains_key(&start_cell) {
                continue;
            }

            let mut found = Vec::new();
            let mut queue = VecDeque::from([(start, CellSet::single(start_cell))]);
            while let Some((head, visited)) = queue.pop_front() {
                for next in catalog.neighbors(head).filter(|&n| walkable(n)) {
                    let cell = catalog.cell_index(catalog.position(next));
                    if visited.contains(cell) {
                        continue;
                    }
                    if let Some(tails) = solved.get(&cell) {
                        found.extend(
                            tails
                                .iter()
                                .filter(|tail| tail.is_disjoint(visited))
                                .map(|tail| tail.union(visited))
                                .filter(|path| path.len() <= max_len),
                        );
                    } else if visited.len() + 1 < max_len {
                        // Room is left for at least the entry after `next`.
                        queue.push_back((next, visited.with(cell)));
                    }
                }
            }

            found.sort_unstable();
            found.dedup();
            solved.insert(start_cell, found);
        }

        let paths: HashMap<usize, Vec<CellSet>> = solved
            .into_iter()
            .map(|(cell, found)| (cell, minimal_sets(found)))
            .collect();
        debug!(
            cells = paths.len(),
            paths = paths.values().map(Vec::len).sum::<usize>(),
            "path table built"
        );

        Self {
            ceiling,
            max_len,
            entry,
            paths,
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Cell index of the entry node.
    pub fn entry_cell(&self) -> usize {
        self.entry
    }

    /// Minimal paths from `id` to the entry; empty when `id` is above the
    /// ceiling or cannot reach the entry within the length bound.
    pub fn paths(&self, catalog: &NodeCatalog, id: NodeId) -> &[CellSet] {
        self.paths_from_cell(catalog.cell_index(catalog.position(id)))
    }

    pub fn paths_from_cell(&self, cell: usize) -> &[CellSet] {
        self.paths.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }
}
