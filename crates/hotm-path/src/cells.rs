use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of grid cells as a 128-bit mask, bit `i` for cell index `i`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellSet(pub u128);

impl CellSet {
    pub const EMPTY: CellSet = CellSet(0);

    pub fn single(cell: usize) -> Self {
        Self(1 << cell)
    }

    pub fn with(self, cell: usize) -> Self {
        Self(self.0 | 1 << cell)
    }

    pub fn contains(self, cell: usize) -> bool {
        self.0 & (1 << cell) != 0
    }

    pub fn union(self, other: CellSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_disjoint(self, other: CellSet) -> bool {
        self.0 & other.0 == 0
    }

    pub fn is_subset(self, other: CellSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_strict_subset(self, other: CellSet) -> bool {
        self != other && self.is_subset(other)
    }

    /// Cell indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let cell = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(cell)
        })
    }
}

impl fmt::Debug for CellSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for CellSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter().fold(CellSet::EMPTY, CellSet::with)
    }
}

/// Sort, deduplicate and drop every set that strictly contains another.
pub fn minimal_sets(mut sets: Vec<CellSet>) -> Vec<CellSet> {
    sets.sort_unstable_by_key(|s| (s.len(), s.0));
    sets.dedup();
    let mut kept: Vec<CellSet> = Vec::with_capacity(sets.len());
    for set in sets {
        // Sorted by size, so any subset of `set` is already in `kept`.
        if !kept.iter().any(|k| k.is_strict_subset(set)) {
            kept.push(set);
        }
    }
    kept
}
