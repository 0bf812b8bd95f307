//! Consensus storage coordinator
//!
//! Groups the typed stores of one consensus instance over a shared [`DbManager`].

use std::path::Path;
use std::sync::Arc;

use consensus_core::BlockLevel;
use database::prelude::*;
use database::{Database, MemoryDb};

use super::types::CacheSizes;

pub struct ConsensusStorage {
    db: DbManager,
    /// Relations per DAG level, index = level
    pub relations: Vec<RelationsStore>,
    pub ghostdag: GhostdagStore,
    pub reachability: ReachabilityStore,
    pub headers: HeaderStore,
    pub utxo_set: UtxoSetStore,
}

impl ConsensusStorage {
    pub fn new(db: DbManager, cache: &CacheSizes, max_block_level: BlockLevel) -> Self {
        let relations = (0..=max_block_level).map(|level| RelationsStore::new(db.clone(), level, cache.relations)).collect();
        Self {
            relations,
            ghostdag: GhostdagStore::new(db.clone(), cache.ghostdag),
            reachability: ReachabilityStore::new(db.clone(), cache.reachability),
            headers: HeaderStore::new(db.clone(), cache.headers),
            utxo_set: UtxoSetStore::new(db.clone(), cache.utxo_set),
            db,
        }
    }

    /// Storage backed by RocksDB at `path`
    pub fn open(path: &Path, cache: &CacheSizes, max_block_level: BlockLevel) -> StoreResult<Self> {
        let backend = Database::open(path)?;
        Ok(Self::new(DbManager::new(Arc::new(backend)), cache, max_block_level))
    }

    /// Storage backed by an in-memory map
    pub fn in_memory(cache: &CacheSizes, max_block_level: BlockLevel) -> Self {
        Self::new(DbManager::new(Arc::new(MemoryDb::new())), cache, max_block_level)
    }

    pub fn db(&self) -> &DbManager {
        &self.db
    }

    /// Level-0 relations, which define the DAG itself
    pub fn relations(&self) -> &RelationsStore {
        &self.relations[0]
    }

    pub fn relations_at(&self, level: BlockLevel) -> Option<&RelationsStore> {
        self.relations.get(level as usize)
    }
}
