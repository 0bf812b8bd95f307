//! Reachability index
//!
//! Every block owns an interval of the label space nested inside the interval
//! of its tree parent (its selected parent), so tree ancestry is an interval
//! containment test. Ancestry through non-selected parents is answered by the
//! future covering set kept for every merged block.

use consensus_core::reachability::{Interval, ReachabilityData};
use consensus_core::Hash;
use database::prelude::*;
use tracing::{debug, trace, Span};

use super::reindex::ReindexContext;
use crate::errors::{ReachabilityError, ReachabilityResult};

#[derive(Clone)]
pub struct ReachabilityManager {
    store: ReachabilityStore,
    span: Span,
}

enum SearchOutput {
    /// An element of the set which is a tree ancestor of the queried block
    Found(Hash),
    /// The queried block is not covered; the index is where it would be inserted
    NotFound(usize),
}

impl ReachabilityManager {
    pub fn new(store: ReachabilityStore) -> Self {
        Self { store, span: tracing::debug_span!("reachability") }
    }

    pub fn store(&self) -> &ReachabilityStore {
        &self.store
    }

    /// Makes `origin` the root of the reachability tree, owning the whole label space.
    /// Does nothing if a root already exists.
    pub fn init(&self, staging: &mut StagingArea, origin: Hash) -> ReachabilityResult<()> {
        self.init_with_interval(staging, origin, Interval::maximal())
    }

    pub fn init_with_interval(&self, staging: &mut StagingArea, origin: Hash, interval: Interval) -> ReachabilityResult<()> {
        let _enter = self.span.enter();
        if self.store.get_root(staging).optional()?.is_some() {
            trace!("reachability root already initialized");
            return Ok(());
        }
        self.store.stage(staging, origin, ReachabilityData::new(None, interval))?;
        self.store.stage_root(staging, origin)?;
        debug!("initialized reachability root {} with interval {}", origin, interval);
        Ok(())
    }

    /// Adds a block to the index: inserts it into the tree under its selected parent
    /// and records it in the future covering set of every other merged block
    pub fn add_block(
        &self,
        staging: &mut StagingArea,
        new_block: Hash,
        selected_parent: Hash,
        mergeset_without_selected_parent: &[Hash],
    ) -> ReachabilityResult<()> {
        let _enter = self.span.enter();
        self.add_tree_child(staging, new_block, selected_parent)?;
        for merged in mergeset_without_selected_parent {
            self.insert_to_future_covering_set(staging, *merged, new_block)?;
        }
        Ok(())
    }

    /// Tree-only insertion of `new_block` under `parent`
    pub fn insert(&self, staging: &mut StagingArea, new_block: Hash, parent: Hash) -> ReachabilityResult<()> {
        let _enter = self.span.enter();
        self.add_tree_child(staging, new_block, parent)
    }

    fn add_tree_child(&self, staging: &mut StagingArea, new_child: Hash, parent: Hash) -> ReachabilityResult<()> {
        let mut parent_data = self.data(staging, parent)?;
        let remaining = self.remaining_interval_after(staging, &parent_data)?;

        parent_data.children.push(new_child);
        self.store.stage(staging, parent, parent_data)?;

        if !remaining.is_empty() {
            let (allocated, _) = remaining.split_half();
            trace!("allocated {} to {} under {}", allocated, new_child, parent);
            self.store.stage(staging, new_child, ReachabilityData::new(Some(parent), allocated))?;
            return Ok(());
        }

        // No room left under the parent: insert with an empty interval and redistribute
        self.store.stage(staging, new_child, ReachabilityData::new(Some(parent), Interval::empty_at(remaining.start)))?;
        let mut ctx = ReindexContext::new(&self.store);
        ctx.reindex_intervals(staging, new_child)
    }

    /// Free capacity of `data` to the right of its last child
    fn remaining_interval_after(&self, staging: &StagingArea, data: &ReachabilityData) -> ReachabilityResult<Interval> {
        let capacity = data.interval.children_capacity();
        match data.children.last() {
            None => Ok(capacity),
            Some(last) => {
                let last_end = self.get_interval(staging, *last)?.end;
                Ok(Interval::new(last_end.min(capacity.end), capacity.end))
            }
        }
    }

    fn insert_to_future_covering_set(&self, staging: &mut StagingArea, merged: Hash, new_block: Hash) -> ReachabilityResult<()> {
        let mut data = self.data(staging, merged)?;
        match self.binary_search_descendant(staging, &data.future_covering_set, new_block)? {
            SearchOutput::Found(covering) => {
                trace!("{} is already covered by {} in the future of {}", new_block, covering, merged);
            }
            SearchOutput::NotFound(index) => {
                data.future_covering_set.insert(index, new_block);
                self.store.stage(staging, merged, data)?;
            }
        }
        Ok(())
    }

    /// Searches an interval-ordered set for a tree ancestor of `descendant`
    fn binary_search_descendant(&self, staging: &StagingArea, ordered: &[Hash], descendant: Hash) -> ReachabilityResult<SearchOutput> {
        let point = self.get_interval(staging, descendant)?.start;
        let (mut low, mut high) = (0usize, ordered.len());
        while low < high {
            let mid = low + (high - low) / 2;
            if self.get_interval(staging, ordered[mid])?.start <= point {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        if low > 0 && self.is_ancestor_of(staging, ordered[low - 1], descendant)? {
            return Ok(SearchOutput::Found(ordered[low - 1]));
        }
        Ok(SearchOutput::NotFound(low))
    }

    fn data(&self, staging: &StagingArea, hash: Hash) -> ReachabilityResult<ReachabilityData> {
        self.store.get(staging, hash).optional()?.ok_or(ReachabilityError::MissingBlock(hash))
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> ReachabilityResult<bool> {
        Ok(self.store.has(staging, hash)?)
    }

    pub fn get_interval(&self, staging: &StagingArea, hash: Hash) -> ReachabilityResult<Interval> {
        Ok(self.data(staging, hash)?.interval)
    }

    pub fn get_parent(&self, staging: &StagingArea, hash: Hash) -> ReachabilityResult<Option<Hash>> {
        Ok(self.data(staging, hash)?.parent)
    }

    pub fn get_children(&self, staging: &StagingArea, hash: Hash) -> ReachabilityResult<Vec<Hash>> {
        Ok(self.data(staging, hash)?.children)
    }

    /// Tree ancestry, where a block counts as its own ancestor
    pub fn is_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
        Ok(self.get_interval(staging, this)?.contains(self.get_interval(staging, queried)?))
    }

    pub fn is_strict_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
        Ok(this != queried && self.is_ancestor_of(staging, this, queried)?)
    }

    /// DAG ancestry: tree ancestry, or a tree ancestor of `queried` in the future covering set of `this`
    pub fn is_dag_ancestor_of(&self, staging: &StagingArea, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
        if self.is_ancestor_of(staging, this, queried)? {
            return Ok(true);
        }
        let future_covering_set = self.data(staging, this)?.future_covering_set;
        Ok(matches!(self.binary_search_descendant(staging, &future_covering_set, queried)?, SearchOutput::Found(..)))
    }

    /// The lowest tree ancestor of `a` which is also a tree ancestor of `b`
    pub fn find_ancestor_of_both(&self, staging: &StagingArea, a: Hash, b: Hash) -> ReachabilityResult<Hash> {
        let mut current = a;
        loop {
            if self.is_ancestor_of(staging, current, b)? {
                return Ok(current);
            }
            match self.get_parent(staging, current)? {
                Some(parent) => current = parent,
                None => return Err(ReachabilityError::MissingBlock(b)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::MemoryDb;
    use std::sync::Arc;

    fn setup(root_interval: Interval) -> (DbManager, ReachabilityManager, Hash) {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let manager = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 1024));
        let root = Hash::from_u64_word(1);
        let mut staging = StagingArea::new();
        manager.init_with_interval(&mut staging, root, root_interval).unwrap();
        staging.commit(&db).unwrap();
        (db, manager, root)
    }

    fn h(word: u64) -> Hash {
        Hash::from_u64_word(word)
    }

    #[test]
    fn children_split_remaining_capacity() {
        let (_db, manager, root) = setup(Interval::new(1, 101));
        let mut staging = StagingArea::new();
        manager.insert(&mut staging, h(2), root).unwrap();
        manager.insert(&mut staging, h(3), root).unwrap();
        assert_eq!(manager.get_interval(&staging, h(2)).unwrap(), Interval::new(1, 51));
        assert_eq!(manager.get_interval(&staging, h(3)).unwrap(), Interval::new(51, 76));
        assert_eq!(manager.get_children(&staging, root).unwrap(), vec![h(2), h(3)]);
        assert_eq!(manager.get_parent(&staging, h(3)).unwrap(), Some(root));
    }

    #[test]
    fn tree_queries() {
        let (_db, manager, root) = setup(Interval::maximal());
        let mut staging = StagingArea::new();
        manager.insert(&mut staging, h(2), root).unwrap();
        manager.insert(&mut staging, h(3), h(2)).unwrap();
        manager.insert(&mut staging, h(4), root).unwrap();

        assert!(manager.is_ancestor_of(&staging, root, h(3)).unwrap());
        assert!(manager.is_ancestor_of(&staging, h(3), h(3)).unwrap());
        assert!(!manager.is_strict_ancestor_of(&staging, h(3), h(3)).unwrap());
        assert!(manager.is_strict_ancestor_of(&staging, h(2), h(3)).unwrap());
        assert!(!manager.is_ancestor_of(&staging, h(3), h(2)).unwrap());
        assert!(!manager.is_ancestor_of(&staging, h(4), h(3)).unwrap());
        assert_eq!(manager.find_ancestor_of_both(&staging, h(3), h(4)).unwrap(), root);
        assert_eq!(manager.find_ancestor_of_both(&staging, h(3), h(2)).unwrap(), h(2));
    }

    #[test]
    fn unknown_parent_is_missing_block() {
        let (_db, manager, _root) = setup(Interval::maximal());
        let mut staging = StagingArea::new();
        assert!(matches!(manager.insert(&mut staging, h(2), h(99)), Err(ReachabilityError::MissingBlock(b)) if b == h(99)));
    }

    #[test]
    fn init_is_idempotent() {
        let (db, manager, root) = setup(Interval::maximal());
        let mut staging = StagingArea::new();
        manager.init(&mut staging, h(50)).unwrap();
        assert!(!staging.is_staged());
        staging.commit(&db).unwrap();
        assert_eq!(manager.store().get_root(&StagingArea::new()).unwrap(), root);
    }

    #[test]
    fn future_covering_set_answers_dag_queries() {
        let (_db, manager, root) = setup(Interval::maximal());
        let mut staging = StagingArea::new();
        // root <- a, root <- b, and c merges b with a as its selected parent
        let (a, b, c) = (h(2), h(3), h(4));
        manager.add_block(&mut staging, a, root, &[]).unwrap();
        manager.add_block(&mut staging, b, root, &[]).unwrap();
        manager.add_block(&mut staging, c, a, &[b]).unwrap();

        assert!(!manager.is_ancestor_of(&staging, b, c).unwrap());
        assert!(manager.is_dag_ancestor_of(&staging, b, c).unwrap());
        assert!(!manager.is_dag_ancestor_of(&staging, c, b).unwrap());
        assert!(!manager.is_dag_ancestor_of(&staging, a, b).unwrap());
        assert_eq!(manager.store().get_future_covering_set(&staging, b).unwrap(), vec![c]);

        // A descendant of c is covered by c without being added to the set
        let d = h(5);
        manager.add_block(&mut staging, d, c, &[]).unwrap();
        assert!(manager.is_dag_ancestor_of(&staging, b, d).unwrap());
        manager.insert_to_future_covering_set(&mut staging, b, d).unwrap();
        assert_eq!(manager.store().get_future_covering_set(&staging, b).unwrap(), vec![c]);
    }
}
