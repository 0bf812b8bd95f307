use std::cmp::Ordering;

use consensus_core::{BlueWorkType, Hash};

/// A block ordered by blue work, then by hash
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_work: BlueWorkType,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_work: BlueWorkType) -> Self {
        Self { hash, blue_work }
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_work.cmp(&other.blue_work).then_with(|| self.hash.cmp(&other.hash))
    }
}

/// Selected parent preference: more blue work wins, then the lower hash
pub fn selected_parent_order(a: &SortableBlock, b: &SortableBlock) -> Ordering {
    a.blue_work.cmp(&b.blue_work).then_with(|| b.hash.cmp(&a.hash))
}
