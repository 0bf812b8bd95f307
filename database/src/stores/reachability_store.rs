use consensus_core::reachability::{Interval, ReachabilityData};
use consensus_core::Hash;

use super::access::CachedDbAccess;
use super::block_key;
use crate::errors::StoreResult;
use crate::key::StorePrefix;
use crate::manager::DbManager;
use crate::staging::StagingArea;

const ROOT_KEY: &str = "root";

#[derive(Clone)]
pub struct ReachabilityStore {
    access: CachedDbAccess<Hash, ReachabilityData>,
    root: CachedDbAccess<&'static str, Hash>,
}

impl ReachabilityStore {
    pub fn new(db: DbManager, cache_size: usize) -> Self {
        Self {
            access: CachedDbAccess::new(db.clone(), cache_size, StorePrefix::Reachability.as_bytes().to_vec()),
            root: CachedDbAccess::new(db, 1, StorePrefix::ReachabilityRoot.as_bytes().to_vec()),
        }
    }

    pub fn stage(&self, staging: &mut StagingArea, hash: Hash, data: ReachabilityData) -> StoreResult<()> {
        self.access.write(staging, block_key(hash)?, data)
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> StoreResult<ReachabilityData> {
        self.access.read(staging, &block_key(hash)?)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> StoreResult<bool> {
        self.access.has(staging, &block_key(hash)?)
    }

    pub fn get_interval(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Interval> {
        Ok(self.get(staging, hash)?.interval)
    }

    pub fn get_parent(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Option<Hash>> {
        Ok(self.get(staging, hash)?.parent)
    }

    pub fn get_children(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Vec<Hash>> {
        Ok(self.get(staging, hash)?.children)
    }

    pub fn get_future_covering_set(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Vec<Hash>> {
        Ok(self.get(staging, hash)?.future_covering_set)
    }

    pub fn stage_root(&self, staging: &mut StagingArea, root: Hash) -> StoreResult<()> {
        self.root.write(staging, ROOT_KEY, block_key(root)?)
    }

    pub fn get_root(&self, staging: &StagingArea) -> StoreResult<Hash> {
        self.root.read(staging, &ROOT_KEY)
    }

    pub fn is_staged(&self, staging: &StagingArea) -> StoreResult<bool> {
        Ok(self.access.is_staged(staging)? || self.root.is_staged(staging)?)
    }

    pub fn unstage_all(&self, staging: &mut StagingArea) {
        self.access.unstage_all(staging);
        self.root.unstage_all(staging);
    }
}
