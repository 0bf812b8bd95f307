//! Block relations across DAG levels

use consensus_core::relations::BlockRelations;
use consensus_core::{BlockLevel, Hash};
use database::prelude::*;
use tracing::trace;

/// Maintains the parent and child lists of every block, per level
#[derive(Clone)]
pub struct RelationsManager {
    stores: Vec<RelationsStore>,
}

impl RelationsManager {
    pub fn new(stores: Vec<RelationsStore>) -> Self {
        Self { stores }
    }

    pub fn max_level(&self) -> BlockLevel {
        self.stores.len().saturating_sub(1) as BlockLevel
    }

    fn store(&self, level: BlockLevel) -> StoreResult<&RelationsStore> {
        self.stores.get(level as usize).ok_or_else(|| StoreError::InvalidParameter(format!("no relations store for level {}", level)))
    }

    /// Stages `block` with `parents` on `level` and registers it as a child of each parent.
    /// Every parent must already be present on that level.
    pub fn add_block(&self, staging: &mut StagingArea, level: BlockLevel, block: Hash, parents: &[Hash]) -> StoreResult<()> {
        let store = self.store(level)?;
        for parent in parents {
            let mut relations = store.get(staging, *parent)?;
            if relations.add_child(block) {
                store.stage(staging, *parent, relations)?;
            }
        }
        store.stage(staging, block, BlockRelations::with_parents(parents.to_vec()))?;
        trace!("staged relations of {} on level {} with {} parents", block, level, parents.len());
        Ok(())
    }

    /// Filters `parents` down to those known on `level`
    pub fn known_parents(&self, staging: &StagingArea, level: BlockLevel, parents: &[Hash]) -> StoreResult<Vec<Hash>> {
        let store = self.store(level)?;
        let mut known = Vec::with_capacity(parents.len());
        for parent in parents {
            if store.has(staging, *parent)? {
                known.push(*parent);
            }
        }
        Ok(known)
    }

    pub fn get_parents(&self, staging: &StagingArea, level: BlockLevel, block: Hash) -> StoreResult<Vec<Hash>> {
        self.store(level)?.get_parents(staging, block)
    }

    pub fn get_children(&self, staging: &StagingArea, level: BlockLevel, block: Hash) -> StoreResult<Vec<Hash>> {
        self.store(level)?.get_children(staging, block)
    }

    pub fn has(&self, staging: &StagingArea, level: BlockLevel, block: Hash) -> StoreResult<bool> {
        self.store(level)?.has(staging, block)
    }

    pub fn is_staged(&self, staging: &StagingArea) -> StoreResult<bool> {
        for store in self.stores.iter() {
            if store.is_staged(staging)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn unstage_all(&self, staging: &mut StagingArea) {
        for store in self.stores.iter() {
            store.unstage_all(staging);
        }
    }
}
