use std::sync::Arc;

use consensus_core::reachability::Interval;
use consensus_core::{BlockHashMap, Hash};
use database::prelude::*;
use database::MemoryDb;

use super::{ReachabilityManager, RelationsManager};

/// Deterministic pseudo-random sequence for building test trees
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

fn h(word: u64) -> Hash {
    Hash::from_u64_word(word)
}

#[test]
fn tree_ancestry_matches_parent_chains() {
    let db = DbManager::new(Arc::new(MemoryDb::new()));
    let reachability = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 4096));
    let relations = RelationsManager::new(vec![RelationsStore::new(db.clone(), 0, 4096)]);
    let root = h(1);

    let mut staging = StagingArea::new();
    // A small label space forces many reindexes
    reachability.init_with_interval(&mut staging, root, Interval::new(1, 2048)).unwrap();
    relations.add_block(&mut staging, 0, root, &[]).unwrap();
    staging.commit(&db).unwrap();

    let mut rng = Lcg(7);
    let mut blocks = vec![root];
    let mut tree_parent: BlockHashMap<Hash> = BlockHashMap::new();
    for i in 2..300u64 {
        // Favor recent blocks so the tree grows deep as well as wide
        let lookback = 1 + rng.next(blocks.len().min(8));
        let parent = blocks[blocks.len() - lookback];
        let block = h(i);

        let mut staging = StagingArea::new();
        relations.add_block(&mut staging, 0, block, &[parent]).unwrap();
        reachability.insert(&mut staging, block, parent).unwrap();
        staging.commit(&db).unwrap();

        tree_parent.insert(block, parent);
        blocks.push(block);
    }

    let staging = StagingArea::new();
    let is_chain_ancestor = |a: Hash, mut b: Hash| -> bool {
        loop {
            if a == b {
                return true;
            }
            match tree_parent.get(&b) {
                Some(p) => b = *p,
                None => return false,
            }
        }
    };
    for _ in 0..2000 {
        let a = blocks[rng.next(blocks.len())];
        let b = blocks[rng.next(blocks.len())];
        assert_eq!(reachability.is_ancestor_of(&staging, a, b).unwrap(), is_chain_ancestor(a, b), "ancestry of {} and {}", a, b);
    }

    // Every node strictly contains its children and children are disjoint and ordered
    for block in blocks.iter() {
        let interval = reachability.get_interval(&staging, *block).unwrap();
        let children = reachability.get_children(&staging, *block).unwrap();
        assert_eq!(children, relations.get_children(&staging, 0, *block).unwrap());
        let mut previous_end = interval.start;
        for child in children {
            let child_interval = reachability.get_interval(&staging, child).unwrap();
            assert!(interval.strictly_contains(child_interval));
            assert!(child_interval.start >= previous_end);
            previous_end = child_interval.end;
        }
    }
}

#[test]
fn committed_intervals_are_visible_to_fresh_stores() {
    let mem = Arc::new(MemoryDb::new());
    let db = DbManager::new(mem.clone());
    let reachability = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 16));
    let mut staging = StagingArea::new();
    reachability.init(&mut staging, h(1)).unwrap();
    reachability.insert(&mut staging, h(2), h(1)).unwrap();
    staging.commit(&db).unwrap();

    let reopened = ReachabilityManager::new(ReachabilityStore::new(DbManager::new(mem), 16));
    let staging = StagingArea::new();
    assert_eq!(reopened.store().get_root(&staging).unwrap(), h(1));
    assert!(reopened.is_strict_ancestor_of(&staging, h(1), h(2)).unwrap());
    assert_eq!(reopened.get_interval(&staging, h(1)).unwrap(), Interval::maximal());
}

#[test]
fn discarded_staging_leaves_index_untouched() {
    let db = DbManager::new(Arc::new(MemoryDb::new()));
    let reachability = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 16));
    let mut staging = StagingArea::new();
    reachability.init(&mut staging, h(1)).unwrap();
    staging.commit(&db).unwrap();

    let mut staging = StagingArea::new();
    reachability.insert(&mut staging, h(2), h(1)).unwrap();
    assert!(reachability.has(&staging, h(2)).unwrap());
    drop(staging);

    let staging = StagingArea::new();
    assert!(!reachability.has(&staging, h(2)).unwrap());
    assert!(reachability.get_children(&staging, h(1)).unwrap().is_empty());
}
