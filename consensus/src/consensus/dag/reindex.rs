use std::collections::VecDeque;

use consensus_core::reachability::Interval;
use consensus_core::{BlockHashMap, Hash};
use database::prelude::*;
use tracing::debug;

use crate::errors::{ReachabilityError, ReachabilityResult};

/// Redistributes intervals inside the smallest subtree able to hold a newly added block
pub(super) struct ReindexContext<'a> {
    store: &'a ReachabilityStore,
    subtree_sizes: BlockHashMap<u64>,
}

impl<'a> ReindexContext<'a> {
    pub fn new(store: &'a ReachabilityStore) -> Self {
        Self { store, subtree_sizes: BlockHashMap::new() }
    }

    pub fn reindex_intervals(&mut self, staging: &mut StagingArea, new_child: Hash) -> ReachabilityResult<()> {
        let mut current = new_child;
        loop {
            let interval = self.interval(staging, current)?;
            let size = self.count_subtree_sizes(staging, current)?;
            if interval.size() >= size {
                break;
            }
            match self.parent(staging, current)? {
                Some(parent) => current = parent,
                None => return Err(ReachabilityError::IntervalExhausted),
            }
        }

        debug!("reindexing subtree of {} ({} blocks)", current, self.subtree_sizes.get(&current).copied().unwrap_or_default());
        self.propagate_interval(staging, current)
    }

    /// Computes the subtree size of `block` and of every block below it, reusing sizes
    /// already known from previous calls
    fn count_subtree_sizes(&mut self, staging: &StagingArea, block: Hash) -> ReachabilityResult<u64> {
        if let Some(size) = self.subtree_sizes.get(&block) {
            return Ok(*size);
        }

        // Post-order walk: a block is summed once all its children are
        let mut stack = vec![(block, false)];
        while let Some((current, children_done)) = stack.pop() {
            if self.subtree_sizes.contains_key(&current) {
                continue;
            }
            let children = self.children(staging, current)?;
            if children_done {
                let size = 1 + children.iter().map(|c| self.subtree_sizes.get(c).copied().unwrap_or_default()).sum::<u64>();
                self.subtree_sizes.insert(current, size);
            } else {
                stack.push((current, true));
                stack.extend(children.into_iter().filter(|c| !self.subtree_sizes.contains_key(c)).map(|c| (c, false)));
            }
        }
        Ok(self.subtree_sizes.get(&block).copied().unwrap_or(1))
    }

    /// Assigns every child inside the subtree of `root` an interval proportional to its
    /// subtree size, biased exponentially towards the largest children
    fn propagate_interval(&mut self, staging: &mut StagingArea, root: Hash) -> ReachabilityResult<()> {
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            let children = self.children(staging, current)?;
            if children.is_empty() {
                continue;
            }
            let capacity = self.interval(staging, current)?.children_capacity();
            let sizes: Vec<u64> = children.iter().map(|c| self.subtree_sizes.get(c).copied().unwrap_or(1)).collect();
            let intervals = capacity.split_exponential(&sizes);
            for (child, interval) in children.into_iter().zip(intervals) {
                self.set_interval(staging, child, interval)?;
                queue.push_back(child);
            }
        }
        Ok(())
    }

    fn set_interval(&self, staging: &mut StagingArea, block: Hash, interval: Interval) -> ReachabilityResult<()> {
        let mut data = self.store.get(staging, block).optional()?.ok_or(ReachabilityError::MissingBlock(block))?;
        data.interval = interval;
        self.store.stage(staging, block, data)?;
        Ok(())
    }

    fn interval(&self, staging: &StagingArea, block: Hash) -> ReachabilityResult<Interval> {
        self.store.get_interval(staging, block).optional()?.ok_or(ReachabilityError::MissingBlock(block))
    }

    fn parent(&self, staging: &StagingArea, block: Hash) -> ReachabilityResult<Option<Hash>> {
        self.store.get_parent(staging, block).optional()?.ok_or(ReachabilityError::MissingBlock(block))
    }

    fn children(&self, staging: &StagingArea, block: Hash) -> ReachabilityResult<Vec<Hash>> {
        self.store.get_children(staging, block).optional()?.ok_or(ReachabilityError::MissingBlock(block))
    }
}

#[cfg(test)]
mod tests {
    use super::super::reachability::ReachabilityManager;
    use super::*;
    use database::MemoryDb;
    use std::sync::Arc;

    fn h(word: u64) -> Hash {
        Hash::from_u64_word(word)
    }

    #[test]
    fn reindex_preserves_nesting_and_order() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let manager = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 1024));
        let root = h(1);
        let mut staging = StagingArea::new();
        manager.init_with_interval(&mut staging, root, Interval::new(1, 65)).unwrap();

        // A chain deep enough to exhaust the halving allocation several times
        let mut tip = root;
        for i in 2..40 {
            manager.insert(&mut staging, h(i), tip).unwrap();
            tip = h(i);
        }
        // A side branch off the chain
        manager.insert(&mut staging, h(100), h(5)).unwrap();
        staging.commit(&db).unwrap();

        let staging = StagingArea::new();
        for i in 2..40 {
            let parent = if i == 2 { root } else { h(i - 1) };
            let parent_interval = manager.get_interval(&staging, parent).unwrap();
            let interval = manager.get_interval(&staging, h(i)).unwrap();
            assert!(!interval.is_empty());
            assert!(parent_interval.strictly_contains(interval), "{} should strictly contain {}", parent_interval, interval);
            assert!(manager.is_ancestor_of(&staging, root, h(i)).unwrap());
        }
        assert!(!manager.is_ancestor_of(&staging, h(100), h(39)).unwrap());
        assert!(!manager.is_ancestor_of(&staging, h(6), h(100)).unwrap());
        assert!(manager.is_ancestor_of(&staging, h(5), h(100)).unwrap());
        let (chain, side) = (manager.get_interval(&staging, h(6)).unwrap(), manager.get_interval(&staging, h(100)).unwrap());
        assert!(chain.end <= side.start, "children keep insertion order");
    }

    #[test]
    fn exhausted_label_space_is_fatal() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let manager = ReachabilityManager::new(ReachabilityStore::new(db, 16));
        let root = h(1);
        let mut staging = StagingArea::new();
        manager.init_with_interval(&mut staging, root, Interval::new(1, 5)).unwrap();

        // Root holds 4 labels: itself plus 3 descendants
        let mut result = Ok(());
        for i in 2..6 {
            result = manager.insert(&mut staging, h(i), root);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(ReachabilityError::IntervalExhausted)));
    }

    #[test]
    fn subtree_sizes_are_memoized() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let manager = ReachabilityManager::new(ReachabilityStore::new(db, 16));
        let mut staging = StagingArea::new();
        manager.init(&mut staging, h(1)).unwrap();
        manager.insert(&mut staging, h(2), h(1)).unwrap();
        manager.insert(&mut staging, h(3), h(1)).unwrap();
        manager.insert(&mut staging, h(4), h(2)).unwrap();

        let mut ctx = ReindexContext::new(manager.store());
        assert_eq!(ctx.count_subtree_sizes(&staging, h(2)).unwrap(), 2);
        assert_eq!(ctx.count_subtree_sizes(&staging, h(1)).unwrap(), 4);
        assert_eq!(ctx.subtree_sizes.get(&h(3)), Some(&1));
    }
}
