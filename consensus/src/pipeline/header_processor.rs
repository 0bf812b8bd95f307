//! Header processor for consensus
//!
//! Connects one header to the DAG as a single unit of work: validation, relations,
//! GHOSTDAG data, reachability and the header itself are staged together and
//! committed atomically, or not at all.

use std::sync::Arc;

use consensus_core::config::params::Params;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::{BlockHashSet, BlockLevel, Hash};
use database::prelude::*;
use parking_lot::Mutex;
use tracing::{debug, info, Span};

use crate::consensus::dag::{ReachabilityManager, RelationsManager};
use crate::consensus::ghostdag::GhostdagProtocol;
use crate::consensus::storage::ConsensusStorage;
use crate::consensus::types::BlockProcessingResult;
use crate::errors::{BlockProcessResult, RuleError};

pub struct HeaderProcessor {
    genesis_hash: Hash,
    max_block_parents: usize,
    max_block_level: BlockLevel,
    storage: Arc<ConsensusStorage>,
    relations: RelationsManager,
    reachability: ReachabilityManager,
    ghostdag: GhostdagProtocol,
    /// Serializes connections: every connection may touch the shared reachability tree
    process_lock: Mutex<()>,
    span: Span,
}

impl HeaderProcessor {
    pub fn new(params: &Params, storage: Arc<ConsensusStorage>) -> Self {
        let genesis_hash = params.genesis.hash();
        let relations = RelationsManager::new(storage.relations.clone());
        let reachability = ReachabilityManager::new(storage.reachability.clone());
        let ghostdag = GhostdagProtocol::new(
            params.ghostdag_k,
            genesis_hash,
            storage.ghostdag.clone(),
            storage.relations().clone(),
            storage.headers.clone(),
            reachability.clone(),
        );
        Self {
            genesis_hash,
            max_block_parents: params.max_block_parents,
            max_block_level: relations.max_level().min(params.max_block_level),
            storage,
            relations,
            reachability,
            ghostdag,
            process_lock: Mutex::new(()),
            span: tracing::info_span!("header_processor", network = %params.network),
        }
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    pub fn reachability(&self) -> &ReachabilityManager {
        &self.reachability
    }

    pub fn ghostdag(&self) -> &GhostdagProtocol {
        &self.ghostdag
    }

    /// Bootstraps the DAG with the genesis header. Calling it again is a no-op.
    pub fn init_genesis(&self, header: &Header) -> BlockProcessResult<()> {
        let _enter = self.span.enter();
        let _guard = self.process_lock.lock();
        if header.hash != self.genesis_hash {
            return Err(RuleError::UnexpectedGenesis(header.hash, self.genesis_hash));
        }
        if self.storage.headers.has(&StagingArea::new(), header.hash)? {
            debug!("genesis {} already initialized", header.hash);
            return Ok(());
        }
        self.commit_genesis(header)?;
        Ok(())
    }

    fn commit_genesis(&self, header: &Header) -> BlockProcessResult<GhostdagData> {
        let mut staging = StagingArea::new();
        for level in 0..=self.max_block_level {
            self.relations.add_block(&mut staging, level, header.hash, &[])?;
        }
        let data = self.ghostdag.genesis_ghostdag_data();
        self.storage.ghostdag.stage(&mut staging, header.hash, data.clone(), false)?;
        self.reachability.init(&mut staging, header.hash)?;
        self.storage.headers.stage(&mut staging, header)?;
        staging.commit(self.storage.db())?;
        info!("initialized DAG with genesis {}", header.hash);
        Ok(data)
    }

    /// Validates and connects `header`, claiming DAG levels `0..=block_level`
    pub fn process_header(&self, header: &Header, block_level: BlockLevel) -> BlockProcessResult<BlockProcessingResult> {
        let _enter = self.span.enter();
        let _guard = self.process_lock.lock();
        let hash = header.hash;

        self.validate(header, block_level)?;

        let data = if hash == self.genesis_hash && header.direct_parents().is_empty() {
            self.commit_genesis(header)?
        } else {
            self.connect(header, block_level)?
        };

        Ok(BlockProcessingResult {
            hash,
            selected_parent: data.selected_parent,
            blue_score: data.blue_score,
            blue_work: data.blue_work,
            mergeset_blues: data.mergeset_blues,
            mergeset_reds: data.mergeset_reds,
        })
    }

    fn validate(&self, header: &Header, block_level: BlockLevel) -> BlockProcessResult<()> {
        let staging = StagingArea::new();
        let hash = header.hash;
        if hash.is_zero() {
            return Err(RuleError::ZeroBlockHash);
        }
        Self::validate_parent_lists(header)?;
        if self.storage.headers.has(&staging, hash)? {
            return Err(RuleError::DuplicateBlock(hash));
        }
        if block_level > self.max_block_level {
            return Err(RuleError::InvalidBlockLevel(block_level, self.max_block_level));
        }

        let parents = header.direct_parents();
        if parents.is_empty() {
            if hash == self.genesis_hash {
                return Ok(());
            }
            return Err(RuleError::NoParents(hash));
        }
        if parents.contains(&hash) {
            return Err(RuleError::CyclicParent(hash));
        }
        if parents.len() > self.max_block_parents {
            return Err(RuleError::TooManyParents(parents.len(), self.max_block_parents));
        }

        let mut missing = Vec::new();
        for parent in parents {
            if !self.storage.headers.has(&staging, *parent)? {
                missing.push(*parent);
            }
        }
        if !missing.is_empty() {
            return Err(RuleError::MissingParents(missing));
        }
        Ok(())
    }

    /// Rejects zero and repeated parents on every level the header references
    fn validate_parent_lists(header: &Header) -> BlockProcessResult<()> {
        for (level, parents) in header.parents_by_level.iter().enumerate() {
            let level = level as BlockLevel;
            let mut seen = BlockHashSet::with_capacity(parents.len());
            for parent in parents {
                if parent.is_zero() {
                    return Err(RuleError::ZeroParent(header.hash, level));
                }
                if !seen.insert(*parent) {
                    return Err(RuleError::DuplicateParent(header.hash, *parent, level));
                }
            }
        }
        Ok(())
    }

    fn connect(&self, header: &Header, block_level: BlockLevel) -> BlockProcessResult<GhostdagData> {
        let hash = header.hash;
        let parents = header.direct_parents();
        let mut staging = StagingArea::new();

        let data = self.ghostdag.ghostdag(&staging, hash, parents)?;

        self.relations.add_block(&mut staging, 0, hash, parents)?;
        for level in 1..=block_level {
            let mut level_parents = self.relations.known_parents(&staging, level, header.parents_at_level(level))?;
            if level_parents.is_empty() {
                level_parents.push(self.genesis_hash);
            }
            self.relations.add_block(&mut staging, level, hash, &level_parents)?;
        }

        self.storage.ghostdag.stage(&mut staging, hash, data.clone(), false)?;
        let mergeset: Vec<Hash> = data.unordered_mergeset_without_selected_parent().collect();
        self.reachability.add_block(&mut staging, hash, data.selected_parent, &mergeset)?;
        self.storage.headers.stage(&mut staging, header)?;

        staging.commit(self.storage.db())?;
        debug!("connected {} at blue score {}", hash, data.blue_score);
        Ok(data)
    }
}
