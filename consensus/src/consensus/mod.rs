//! Consensus module for BlockDAG-based blockchain
//!
//! This module implements the core consensus logic using GHOSTDAG algorithm,
//! including DAG management, reachability queries, and protocol rules.

pub mod dag;
pub mod ghostdag;
pub mod past_median_time;
pub mod storage;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::{BlockLevel, Hash};
use database::prelude::*;
use tracing::info;

use crate::errors::{BlockProcessResult, ReachabilityResult};
use crate::pipeline::{BlockProcessor, HeaderProcessor};

pub use past_median_time::PastMedianTimeManager;
pub use storage::ConsensusStorage;
pub use types::{BlockProcessingResult, CacheSizes, ConsensusConfig};

/// A consensus instance: one DAG, its stores, and the processor connecting headers to it
pub struct Consensus {
    config: ConsensusConfig,
    storage: Arc<ConsensusStorage>,
    processor: Arc<HeaderProcessor>,
    past_median_time: PastMedianTimeManager,
}

impl Consensus {
    /// Wires the processor over `storage` and bootstraps genesis when the store is fresh
    pub fn new(config: ConsensusConfig, storage: Arc<ConsensusStorage>) -> BlockProcessResult<Self> {
        config.params.validate()?;
        let processor = Arc::new(HeaderProcessor::new(&config.params, storage.clone()));
        processor.init_genesis(&config.params.genesis.header())?;
        let past_median_time =
            PastMedianTimeManager::new(config.params.past_median_time_window, storage.ghostdag.clone(), storage.headers.clone());
        info!("consensus ready on {} (k = {})", config.params.network, config.params.ghostdag_k);
        Ok(Self { config, storage, processor, past_median_time })
    }

    /// Opens (or creates) a RocksDB-backed instance at `path`
    pub fn open(config: ConsensusConfig, path: &Path) -> BlockProcessResult<Self> {
        let storage = ConsensusStorage::open(path, &config.cache, config.params.max_block_level)?;
        Self::new(config, Arc::new(storage))
    }

    pub fn in_memory(config: ConsensusConfig) -> BlockProcessResult<Self> {
        let storage = ConsensusStorage::in_memory(&config.cache, config.params.max_block_level);
        Self::new(config, Arc::new(storage))
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<ConsensusStorage> {
        &self.storage
    }

    pub fn genesis_hash(&self) -> Hash {
        self.processor.genesis_hash()
    }

    pub fn process_header(&self, header: &Header, block_level: BlockLevel) -> BlockProcessResult<BlockProcessingResult> {
        self.processor.process_header(header, block_level)
    }

    /// Starts a supervised worker feeding headers to this instance's processor
    pub fn spawn_block_processor(&self) -> std::io::Result<BlockProcessor> {
        BlockProcessor::spawn(self.processor.clone())
    }

    pub fn has_block(&self, hash: Hash) -> StoreResult<bool> {
        self.storage.headers.has(&StagingArea::new(), hash)
    }

    pub fn get_header(&self, hash: Hash) -> StoreResult<Header> {
        self.storage.headers.get(&StagingArea::new(), hash)
    }

    pub fn get_ghostdag_data(&self, hash: Hash) -> StoreResult<GhostdagData> {
        self.storage.ghostdag.get(&StagingArea::new(), hash, false)
    }

    pub fn get_blue_score(&self, hash: Hash) -> StoreResult<u64> {
        self.storage.ghostdag.get_blue_score(&StagingArea::new(), hash)
    }

    pub fn get_children(&self, hash: Hash) -> StoreResult<Vec<Hash>> {
        self.storage.relations().get_children(&StagingArea::new(), hash)
    }

    /// Median timestamp over `hash` and its recent selected-chain ancestors
    pub fn past_median_time(&self, hash: Hash) -> StoreResult<u64> {
        let _guard = self.storage.db().read_guard();
        self.past_median_time.past_median_time(&StagingArea::new(), hash)
    }

    /// Whether `this` is in the past of `queried` (inclusive)
    pub fn is_dag_ancestor_of(&self, this: Hash, queried: Hash) -> ReachabilityResult<bool> {
        // Hold off commits so a concurrent reindex is never seen half applied
        let _guard = self.storage.db().read_guard();
        self.processor.reachability().is_dag_ancestor_of(&StagingArea::new(), this, queried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::config::params::Params;

    #[test]
    fn fresh_instance_holds_only_genesis() {
        let consensus = Consensus::in_memory(ConsensusConfig::new(Params::devnet())).unwrap();
        let genesis = consensus.genesis_hash();
        assert!(consensus.has_block(genesis).unwrap());
        assert_eq!(consensus.get_blue_score(genesis).unwrap(), 0);
        assert!(consensus.get_children(genesis).unwrap().is_empty());
        assert!(consensus.is_dag_ancestor_of(genesis, genesis).unwrap());
        assert_eq!(consensus.storage().headers.count().unwrap(), 1);
        assert_eq!(consensus.past_median_time(genesis).unwrap(), consensus.config().params.genesis.timestamp);
    }

    #[test]
    fn rejects_invalid_params() {
        let mut params = Params::devnet();
        params.max_block_parents = 0;
        assert!(Consensus::in_memory(ConsensusConfig::new(params)).is_err());
    }
}
