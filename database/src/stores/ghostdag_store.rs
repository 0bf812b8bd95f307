use consensus_core::ghostdag::GhostdagData;
use consensus_core::{BlockHashMap, BlueWorkType, Hash, KType};

use super::access::{CachedDbAccess, StoreKey};
use super::block_key;
use crate::errors::StoreResult;
use crate::key::StorePrefix;
use crate::manager::DbManager;
use crate::staging::StagingArea;

/// GHOSTDAG entries are kept separately for blocks whose data was received as
/// trusted (e.g. alongside a pruning proof) and blocks colored locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GhostdagKey {
    hash: Hash,
    is_trusted_data: bool,
}

impl GhostdagKey {
    pub fn new(hash: Hash, is_trusted_data: bool) -> StoreResult<Self> {
        Ok(Self { hash: block_key(hash)?, is_trusted_data })
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn is_trusted_data(&self) -> bool {
        self.is_trusted_data
    }
}

impl StoreKey for GhostdagKey {
    fn to_key_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(33);
        bytes.extend_from_slice(self.hash.as_bytes());
        bytes.push(self.is_trusted_data as u8);
        bytes
    }
}

#[derive(Clone)]
pub struct GhostdagStore {
    access: CachedDbAccess<GhostdagKey, GhostdagData>,
}

impl GhostdagStore {
    pub fn new(db: DbManager, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, StorePrefix::Ghostdag.as_bytes().to_vec()) }
    }

    pub fn stage(&self, staging: &mut StagingArea, hash: Hash, data: GhostdagData, is_trusted_data: bool) -> StoreResult<()> {
        self.access.write(staging, GhostdagKey::new(hash, is_trusted_data)?, data)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash, is_trusted_data: bool) -> StoreResult<GhostdagData> {
        self.access.read(staging, &GhostdagKey::new(hash, is_trusted_data)?)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash, is_trusted_data: bool) -> StoreResult<bool> {
        self.access.has(staging, &GhostdagKey::new(hash, is_trusted_data)?)
    }

    pub fn get_blue_score(&self, staging: &StagingArea, hash: Hash) -> StoreResult<u64> {
        Ok(self.get(staging, hash, false)?.blue_score)
    }

    pub fn get_blue_work(&self, staging: &StagingArea, hash: Hash) -> StoreResult<BlueWorkType> {
        Ok(self.get(staging, hash, false)?.blue_work)
    }

    pub fn get_selected_parent(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Hash> {
        Ok(self.get(staging, hash, false)?.selected_parent)
    }

    pub fn get_mergeset_blues(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Vec<Hash>> {
        Ok(self.get(staging, hash, false)?.mergeset_blues)
    }

    pub fn get_blues_anticone_sizes(&self, staging: &StagingArea, hash: Hash) -> StoreResult<BlockHashMap<KType>> {
        Ok(self.get(staging, hash, false)?.blues_anticone_sizes)
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

    fn data(blue_score: u64, selected_parent: Hash) -> GhostdagData {
        let mut data = GhostdagData::new_with_selected_parent(selected_parent, 18);
        data.finalize_score_and_work(blue_score, BlueWorkType::from(blue_score * 10));
        data
    }

    #[test]
    fn key_rejects_zero_hash() {
        assert!(matches!(GhostdagKey::new(ZERO_HASH, false), Err(StoreError::InvalidParameter(_))));
        assert!(matches!(GhostdagKey::new(ZERO_HASH, true), Err(StoreError::InvalidParameter(_))));
        let key = GhostdagKey::new(Hash::from_u64_word(1), true).unwrap();
        assert!(key.is_trusted_data());
        assert_eq!(key.to_key_bytes().len(), 33);
    }

    #[test]
    fn trusted_and_local_entries_are_distinct() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let store = GhostdagStore::new(db.clone(), 16);
        let (parent, block) = (Hash::from_u64_word(1), Hash::from_u64_word(2));

        let mut staging = StagingArea::new();
        store.stage(&mut staging, block, data(5, parent), false).unwrap();
        store.stage(&mut staging, block, data(9, parent), true).unwrap();
        assert_eq!(store.get_blue_score(&staging, block).unwrap(), 5);
        staging.commit(&db).unwrap();

        let staging = StagingArea::new();
        assert_eq!(store.get(&staging, block, true).unwrap().blue_score, 9);
        assert_eq!(store.get_blue_work(&staging, block).unwrap(), BlueWorkType::from(50u64));
        assert_eq!(store.get_selected_parent(&staging, block).unwrap(), parent);
        assert_eq!(store.get_mergeset_blues(&staging, block).unwrap(), vec![parent]);
        assert_eq!(store.get_blues_anticone_sizes(&staging, block).unwrap().get(&parent), Some(&0));
        assert!(!store.has(&staging, parent, false).unwrap());
    }

    #[test]
    fn survives_reopen_through_fresh_store() {
        let mem = Arc::new(MemoryDb::new());
        let db = DbManager::new(mem.clone());
        let block = Hash::from_u64_word(3);
        {
            let store = GhostdagStore::new(db.clone(), 16);
            let mut staging = StagingArea::new();
            store.stage(&mut staging, block, GhostdagData::genesis(), false).unwrap();
            staging.commit(&db).unwrap();
        }
        let store = GhostdagStore::new(DbManager::new(mem), 0);
        assert_eq!(store.get(&StagingArea::new(), block, false).unwrap(), GhostdagData::genesis());
    }
}
