use consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::utxo_diff::UtxoDiff;

use super::access::CachedDbAccess;
use crate::errors::StoreResult;
use crate::key::StorePrefix;
use crate::manager::DbManager;
use crate::staging::StagingArea;

#[derive(Clone)]
pub struct UtxoSetStore {
    access: CachedDbAccess<TransactionOutpoint, UtxoEntry>,
}

impl UtxoSetStore {
    pub fn new(db: DbManager, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, StorePrefix::UtxoSet.as_bytes().to_vec()) }
    }

    /// Stages removals as deletions and additions as writes
    pub fn stage_diff(&self, staging: &mut StagingArea, diff: &UtxoDiff) -> StoreResult<()> {
        for (outpoint, _) in diff.removed.iter() {
            self.access.delete(staging, *outpoint)?;
        }
        for (outpoint, entry) in diff.added.iter() {
            self.access.write(staging, *outpoint, entry.clone())?;
        }
        Ok(())
    }

    pub fn get(&self, staging: &StagingArea, outpoint: &TransactionOutpoint) -> StoreResult<UtxoEntry> {
        self.access.read(staging, outpoint)
    }

    pub fn has(&self, staging: &StagingArea, outpoint: &TransactionOutpoint) -> StoreResult<bool> {
        self.access.has(staging, outpoint)
    }

    pub fn is_staged(&self, staging: &StagingArea) -> StoreResult<bool> {
        self.access.is_staged(staging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::tx::ScriptPublicKey;
    use consensus_core::Hash;
    use crate::memory::MemoryDb;
    use std::sync::Arc;

    fn entry(amount: u64) -> UtxoEntry {
        UtxoEntry::new(amount, ScriptPublicKey::from_vec(0, vec![0x51]), 1, false)
    }

    #[test]
    fn diff_spends_and_creates() {
        let db = DbManager::new(Arc::new(MemoryDb::new()));
        let store = UtxoSetStore::new(db.clone(), 32);
        let spent = TransactionOutpoint::new(Hash::from_u64_word(1), 0);
        let created = TransactionOutpoint::new(Hash::from_u64_word(2), 1);

        let mut staging = StagingArea::new();
        store.stage_diff(&mut staging, &UtxoDiff { added: vec![(spent, entry(100))], removed: vec![] }).unwrap();
        staging.commit(&db).unwrap();

        let mut staging = StagingArea::new();
        let diff = UtxoDiff { added: vec![(created, entry(60))], removed: vec![(spent, entry(100))] };
        store.stage_diff(&mut staging, &diff).unwrap();
        assert!(!store.has(&staging, &spent).unwrap());
        assert_eq!(store.get(&staging, &created).unwrap().amount, 60);
        // Committed view is unchanged until commit
        assert!(store.has(&StagingArea::new(), &spent).unwrap());
        staging.commit(&db).unwrap();

        let staging = StagingArea::new();
        assert!(!store.has(&staging, &spent).unwrap());
        assert!(store.has(&staging, &created).unwrap());
    }
}
