use crate::catalog::{NodeId, PowderType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Node levels of one tree. Absent nodes are level 0.
///
/// An `Assignment` is a value: transitions such as [`apply`](Self::apply)
/// return a new assignment and leave the receiver untouched, so candidate
/// purchases can be scored side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment(BTreeMap<NodeId, u32>);

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node in `nodes` at level 1.
    pub fn selected(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self(nodes.into_iter().map(|id| (id, 1)).collect())
    }

    pub fn level(&self, id: NodeId) -> u32 {
        self.0.get(&id).copied().unwrap_or(0)
    }

    /// One more level on `id`.
    pub fn apply(&self, id: NodeId) -> Self {
        self.with_level(id, self.level(id) + 1)
    }

    /// `id` set to `level`; level 0 removes the entry.
    pub fn with_level(&self, id: NodeId, level: u32) -> Self {
        let mut next = self.0.clone();
        if level == 0 {
            next.remove(&id);
        } else {
            next.insert(id, level);
        }
        Self(next)
    }

    /// Non-zero levels in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.0.iter().map(|(&id, &level)| (id, level))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NodeId, u32)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (NodeId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|&(_, level)| level > 0).collect())
    }
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// Powder balances. Only decreases during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub mithril: u64,
    pub gemstone: u64,
    pub glacite: u64,
}

impl Budget {
    pub fn new(mithril: u64, gemstone: u64, glacite: u64) -> Self {
        Self {
            mithril,
            gemstone,
            glacite,
        }
    }

    pub fn get(&self, powder: PowderType) -> u64 {
        match powder {
            PowderType::Mithril => self.mithril,
            PowderType::Gemstone => self.gemstone,
            PowderType::Glacite => self.glacite,
        }
    }

    pub fn can_afford(&self, powder: PowderType, cost: u64) -> bool {
        self.get(powder) >= cost
    }

    /// Subtract `cost` from the `powder` balance. Returns `false` and leaves
    /// the balance unchanged when it is too small.
    pub fn debit(&mut self, powder: PowderType, cost: u64) -> bool {
        let slot = match powder {
            PowderType::Mithril => &mut self.mithril,
            PowderType::Gemstone => &mut self.gemstone,
            PowderType::Glacite => &mut self.glacite,
        };
        match slot.checked_sub(cost) {
            Some(left) => {
                *slot = left;
                true
            }
            None => false,
        }
    }
}
