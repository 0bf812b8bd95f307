use consensus_core::relations::BlockRelations;
use consensus_core::{BlockLevel, Hash};

use super::access::CachedDbAccess;
use super::block_key;
use crate::errors::StoreResult;
use crate::key::StorePrefix;
use crate::manager::DbManager;
use crate::staging::StagingArea;

/// Parents and children of blocks on a single DAG level
#[derive(Clone)]
pub struct RelationsStore {
    level: BlockLevel,
    access: CachedDbAccess<Hash, BlockRelations>,
}

impl RelationsStore {
    pub fn new(db: DbManager, level: BlockLevel, cache_size: usize) -> Self {
        Self { level, access: CachedDbAccess::new(db, cache_size, StorePrefix::Relations.with_level(level)) }
    }

    pub fn level(&self) -> BlockLevel {
        self.level
    }

    pub fn stage(&self, staging: &mut StagingArea, hash: Hash, relations: BlockRelations) -> StoreResult<()> {
        self.access.write(staging, block_key(hash)?, relations)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> StoreResult<BlockRelations> {
        self.access.read(staging, &block_key(hash)?)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> StoreResult<bool> {
        self.access.has(staging, &block_key(hash)?)
    }

    pub fn get_parents(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Vec<Hash>> {
        Ok(self.get(staging, hash)?.parents)
    }

    pub fn get_children(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Vec<Hash>> {
        Ok(self.get(staging, hash)?.children)
    }

    pub fn is_staged(&self, staging: &StagingArea) -> StoreResult<bool> {
        self.access.is_staged(staging)
    }

    pub fn unstage_all(&self, staging: &mut StagingArea) {
        self.access.unstage_all(staging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::memory::MemoryDb;
    use consensus_core::ZERO_HASH;
    use std::sync::Arc;

    #[test]
    fn levels_are_isolated() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let level0 = RelationsStore::new(db.clone(), 0, 8);
        let level1 = RelationsStore::new(db.clone(), 1, 8);
        let (a, b) = (Hash::from_u64_word(1), Hash::from_u64_word(2));

        let mut staging = StagingArea::new();
        level0.stage(&mut staging, b, BlockRelations::with_parents(vec![a])).unwrap();
        assert!(level0.is_staged(&staging).unwrap());
        assert!(!level1.is_staged(&staging).unwrap());
        staging.commit(&db).unwrap();

        let staging = StagingArea::new();
        assert_eq!(level0.get_parents(&staging, b).unwrap(), vec![a]);
        assert!(level0.get_children(&staging, b).unwrap().is_empty());
        assert!(!level1.has(&staging, b).unwrap());
        assert!(matches!(level1.get(&staging, b), Err(StoreError::KeyNotFound(_))));
    }

    #[test]
    fn zero_hash_is_rejected() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let store = RelationsStore::new(db, 0, 8);
        let mut staging = StagingArea::new();
        assert!(matches!(store.stage(&mut staging, ZERO_HASH, BlockRelations::default()), Err(StoreError::InvalidParameter(_))));
        assert!(matches!(store.has(&staging, ZERO_HASH), Err(StoreError::InvalidParameter(_))));
        assert!(!staging.is_staged());
    }

    #[test]
    fn unstage_all_drops_pending_relations() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let store = RelationsStore::new(db, 0, 8);
        let mut staging = StagingArea::new();
        store.stage(&mut staging, Hash::from_u64_word(5), BlockRelations::default()).unwrap();
        store.unstage_all(&mut staging);
        assert!(!store.is_staged(&staging).unwrap());
    }
}
