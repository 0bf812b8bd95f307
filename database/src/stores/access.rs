use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::hash::Hash as StdHash;
use std::sync::Arc;

use consensus_core::tx::TransactionOutpoint;
use consensus_core::Hash;
use serde::{de::DeserializeOwned, Serialize};

use crate::cache::Cache;
use crate::errors::{StoreError, StoreResult};
use crate::key::DbKey;
use crate::manager::{DbManager, DbTransaction};
use crate::staging::{StagingArea, StagingShard};

/// A store key with a stable byte encoding
pub trait StoreKey: Clone + Eq + StdHash + Send + Sync + 'static {
    fn to_key_bytes(&self) -> Vec<u8>;
}

impl StoreKey for Hash {
    fn to_key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl StoreKey for TransactionOutpoint {
    fn to_key_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(36);
        bytes.extend_from_slice(self.transaction_id.as_bytes());
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes
    }
}

impl StoreKey for &'static str {
    fn to_key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

pub trait StoreValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static> StoreValue for T {}

/// Result of looking a key up in a shard
pub enum Staged<'a, V> {
    Added(&'a V),
    Deleted,
    Absent,
}

/// Pending writes and deletions of one store inside a staging area
pub struct StoreShard<K, V> {
    prefix: Vec<u8>,
    cache: Arc<Cache<K, V>>,
    to_add: HashMap<K, V>,
    to_delete: HashSet<K>,
}

impl<K: StoreKey, V: StoreValue> StoreShard<K, V> {
    pub fn new(prefix: Vec<u8>, cache: Arc<Cache<K, V>>) -> Self {
        Self { prefix, cache, to_add: HashMap::new(), to_delete: HashSet::new() }
    }

    pub fn stage(&mut self, key: K, value: V) {
        self.to_delete.remove(&key);
        self.to_add.insert(key, value);
    }

    pub fn stage_delete(&mut self, key: K) {
        self.to_add.remove(&key);
        self.to_delete.insert(key);
    }

    pub fn lookup(&self, key: &K) -> Staged<'_, V> {
        if let Some(value) = self.to_add.get(key) {
            Staged::Added(value)
        } else if self.to_delete.contains(key) {
            Staged::Deleted
        } else {
            Staged::Absent
        }
    }

    pub fn staged_len(&self) -> usize {
        self.to_add.len() + self.to_delete.len()
    }
}

impl<K: StoreKey, V: StoreValue> StagingShard for StoreShard<K, V> {
    fn commit(&self, tx: &mut DbTransaction) -> StoreResult<()> {
        for (key, value) in self.to_add.iter() {
            tx.put(DbKey::new(&self.prefix, key.to_key_bytes()), bincode::serialize(value)?);
        }
        for key in self.to_delete.iter() {
            tx.delete(DbKey::new(&self.prefix, key.to_key_bytes()));
        }
        Ok(())
    }

    fn publish(self: Box<Self>) {
        let shard = *self;
        shard.cache.remove_many(shard.to_delete.iter());
        shard.cache.insert_many(shard.to_add);
    }

    fn is_staged(&self) -> bool {
        !self.to_add.is_empty() || !self.to_delete.is_empty()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Typed, cached access to the entries under one key prefix.
///
/// Reads look at the caller's staging shard first, then the cache, then the
/// database. Writes only ever go to a staging shard.
#[derive(Clone)]
pub struct CachedDbAccess<K, V> {
    db: DbManager,
    cache: Arc<Cache<K, V>>,
    prefix: Vec<u8>,
}

impl<K: StoreKey, V: StoreValue> CachedDbAccess<K, V> {
    pub fn new(db: DbManager, cache_size: usize, prefix: Vec<u8>) -> Self {
        Self { db, cache: Arc::new(Cache::new(cache_size)), prefix }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn db_key(&self, key: &K) -> DbKey {
        DbKey::new(&self.prefix, key.to_key_bytes())
    }

    fn shard<'a>(&self, staging: &'a StagingArea) -> StoreResult<Option<&'a StoreShard<K, V>>> {
        staging.shard::<StoreShard<K, V>>(&self.prefix)
    }

    fn shard_mut<'a>(&self, staging: &'a mut StagingArea) -> StoreResult<&'a mut StoreShard<K, V>> {
        staging.get_or_create_shard(&self.prefix, || StoreShard::new(self.prefix.clone(), self.cache.clone()))
    }

    pub fn read(&self, staging: &StagingArea, key: &K) -> StoreResult<V> {
        if let Some(shard) = self.shard(staging)? {
            match shard.lookup(key) {
                Staged::Added(value) => return Ok(value.clone()),
                Staged::Deleted => return Err(StoreError::KeyNotFound(self.db_key(key))),
                Staged::Absent => {}
            }
        }
        self.read_committed(key)
    }

    /// Reads committed state only, ignoring any staging area
    pub fn read_committed(&self, key: &K) -> StoreResult<V> {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }
        let _guard = self.db.read_guard();
        let db_key = self.db_key(key);
        match self.db.get(&db_key)? {
            Some(bytes) => {
                let value: V = bincode::deserialize(&bytes)?;
                self.cache.insert(key.clone(), value.clone());
                Ok(value)
            }
            None => Err(StoreError::KeyNotFound(db_key)),
        }
    }

    pub fn has(&self, staging: &StagingArea, key: &K) -> StoreResult<bool> {
        if let Some(shard) = self.shard(staging)? {
            match shard.lookup(key) {
                Staged::Added(_) => return Ok(true),
                Staged::Deleted => return Ok(false),
                Staged::Absent => {}
            }
        }
        if self.cache.contains_key(key) {
            return Ok(true);
        }
        let _guard = self.db.read_guard();
        self.db.has(&self.db_key(key))
    }

    pub fn write(&self, staging: &mut StagingArea, key: K, value: V) -> StoreResult<()> {
        self.shard_mut(staging)?.stage(key, value);
        Ok(())
    }

    pub fn delete(&self, staging: &mut StagingArea, key: K) -> StoreResult<()> {
        self.shard_mut(staging)?.stage_delete(key);
        Ok(())
    }

    /// Whether this store has pending writes in `staging`
    pub fn is_staged(&self, staging: &StagingArea) -> StoreResult<bool> {
        Ok(self.shard(staging)?.map_or(false, |shard| shard.is_staged()))
    }

    pub fn unstage_all(&self, staging: &mut StagingArea) {
        staging.unstage(&self.prefix);
    }

    /// Number of committed entries under this prefix
    pub fn count_committed(&self) -> StoreResult<usize> {
        let _guard = self.db.read_guard();
        self.db.count_prefix(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TestKvBackend;
    use crate::memory::MemoryDb;

    fn setup() -> (Arc<MemoryDb>, DbManager) {
        let mem = Arc::new(MemoryDb::new());
        let db = DbManager::new(mem.clone());
        (mem, db)
    }

    #[test]
    fn read_your_writes_before_commit() {
        let (mem, db) = setup();
        let access: CachedDbAccess<Hash, u64> = CachedDbAccess::new(db.clone(), 16, vec![9]);
        let key = Hash::from_u64_word(1);

        let mut staging = StagingArea::new();
        access.write(&mut staging, key, 42).unwrap();
        assert_eq!(access.read(&staging, &key).unwrap(), 42);
        assert!(access.has(&staging, &key).unwrap());
        assert!(access.is_staged(&staging).unwrap());

        // Not visible outside the staging area
        assert!(matches!(access.read_committed(&key), Err(StoreError::KeyNotFound(_))));
        assert!(!access.has(&StagingArea::new(), &key).unwrap());
        assert!(mem.is_empty());

        staging.commit(&db).unwrap();
        assert_eq!(access.read(&StagingArea::new(), &key).unwrap(), 42);
        assert_eq!(access.count_committed().unwrap(), 1);
    }

    #[test]
    fn staged_delete_hides_committed_entry() {
        let (_mem, db) = setup();
        let access: CachedDbAccess<Hash, u64> = CachedDbAccess::new(db.clone(), 16, vec![9]);
        let key = Hash::from_u64_word(7);

        let mut staging = StagingArea::new();
        access.write(&mut staging, key, 1).unwrap();
        staging.commit(&db).unwrap();

        let mut staging = StagingArea::new();
        access.delete(&mut staging, key).unwrap();
        assert!(!access.has(&staging, &key).unwrap());
        assert!(access.read(&staging, &key).is_err());
        assert_eq!(access.read_committed(&key).unwrap(), 1);

        // Write after delete wins
        access.write(&mut staging, key, 2).unwrap();
        assert_eq!(access.read(&staging, &key).unwrap(), 2);
        access.delete(&mut staging, key).unwrap();

        staging.commit(&db).unwrap();
        assert!(!access.has(&StagingArea::new(), &key).unwrap());
        assert_eq!(access.count_committed().unwrap(), 0);
    }

    #[test]
    fn failed_commit_leaves_cache_and_db_untouched() {
        let (mem, db) = setup();
        let a: CachedDbAccess<Hash, u64> = CachedDbAccess::new(db.clone(), 16, vec![1]);
        let b: CachedDbAccess<Hash, String> = CachedDbAccess::new(db.clone(), 16, vec![2]);
        let key = Hash::from_u64_word(3);

        let mut staging = StagingArea::new();
        a.write(&mut staging, key, 5).unwrap();
        b.write(&mut staging, key, "five".to_string()).unwrap();
        mem.fail_next_write("simulated");
        assert!(staging.commit(&db).is_err());

        assert!(mem.is_empty());
        assert!(!a.has(&StagingArea::new(), &key).unwrap());
        assert!(!b.has(&StagingArea::new(), &key).unwrap());
    }

    #[test]
    fn unstage_all_discards_shard() {
        let (_mem, db) = setup();
        let access: CachedDbAccess<&'static str, u8> = CachedDbAccess::new(db, 4, vec![5]);
        let mut staging = StagingArea::new();
        access.write(&mut staging, "root", 1).unwrap();
        access.unstage_all(&mut staging);
        assert!(!access.is_staged(&staging).unwrap());
        assert!(!access.has(&staging, &"root").unwrap());
    }

    #[test]
    fn outpoint_key_layout() {
        let outpoint = TransactionOutpoint::new(Hash::from_u64_word(1), 0x01020304);
        let bytes = outpoint.to_key_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[32..], &[4, 3, 2, 1]);
    }
}
