use crate::cells::{CellSet, minimal_sets};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Hard caps on the covering search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Most partial covers carried from one group to the next.
    pub max_frontier: usize,
    /// Most `frontier x choice` combinations tried overall.
    pub max_work: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_frontier: 100_000,
            max_work: 50_000_000,
        }
    }
}

/// Minimal covers found, and whether a limit cut the search short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub sets: Vec<CellSet>,
    pub truncated: bool,
}

/// Pick one set from every group so that the union stays within `max_len`
/// cells, and return the minimal such unions.
///
/// Groups are folded left to right over a frontier of partial covers. After
/// each group the frontier is deduplicated and strict supersets are dropped;
/// any completion of a superset is itself a superset of the same completion
/// of the smaller cover, so nothing minimal is lost.
///
/// No groups means nothing to cover and yields no sets. A group with no
/// choices makes the whole search infeasible.
pub fn union_search(groups: &[&[CellSet]], max_len: usize, limits: SearchLimits) -> SearchResult {
    if groups.is_empty() {
        return SearchResult::default();
    }

    let mut frontier = vec![CellSet::EMPTY];
    let mut work: u64 = 0;
    let mut truncated = false;

    for group in groups {
        let mut next = Vec::new();
        for &partial in &frontier {
            for &choice in group.iter() {
                work += 1;
                if work > limits.max_work {
                    // The fold has not taken a choice from every group yet.
                    warn!(groups = groups.len(), work, "covering search hit its work cap");
                    return SearchResult {
                        sets: Vec::new(),
                        truncated: true,
                    };
                }
                let union = partial.union(choice);
                if union.len() <= max_len {
                    next.push(union);
                }
            }
        }

        frontier = minimal_sets(next);
        if frontier.is_empty() {
            return SearchResult {
                sets: Vec::new(),
                truncated,
            };
        }
        if frontier.len() > limits.max_frontier {
            truncated = true;
            frontier.truncate(limits.max_frontier);
        }
    }

    if truncated {
        warn!(
            groups = groups.len(),
            kept = frontier.len(),
            "covering search frontier capped, result may be incomplete"
        );
    }
    SearchResult {
        sets: frontier,
        truncated,
    }
}
