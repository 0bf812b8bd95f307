//! Transactional overlay over the typed stores.
//!
//! A [`StagingArea`] is owned by one unit of consensus work. Every store it touches
//! contributes a [`StagingShard`] holding that store's pending writes; store reads
//! consult the shard first, so work inside the area sees its own writes. Nothing
//! reaches the backend or the store caches until [`StagingArea::commit`], and
//! dropping the area discards everything.

use std::any::Any;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::errors::{StoreError, StoreResult};
use crate::manager::{DbManager, DbTransaction};

/// Identity of a store inside a staging area: the store's key prefix
pub type ShardId = Vec<u8>;

/// Pending writes of a single store
pub trait StagingShard: Any + Send {
    /// Serializes the pending entries into `tx`
    fn commit(&self, tx: &mut DbTransaction) -> StoreResult<()>;

    /// Makes the committed entries visible in the owning store's cache.
    /// Called only after the database write succeeded.
    fn publish(self: Box<Self>);

    fn is_staged(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Default)]
pub struct StagingArea {
    shards: BTreeMap<ShardId, Box<dyn StagingShard>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shard for `id`, creating it with `factory` on first access.
    /// The same id always yields the same shard instance.
    pub fn get_or_create_shard<S, F>(&mut self, id: &[u8], factory: F) -> StoreResult<&mut S>
    where
        S: StagingShard,
        F: FnOnce() -> S,
    {
        let shard = self.shards.entry(id.to_vec()).or_insert_with(|| Box::new(factory()));
        shard
            .as_mut()
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or_else(|| StoreError::InvalidParameter(format!("shard {} is registered with a different type", hex::encode(id))))
    }

    /// Looks up an existing shard without creating one
    pub fn shard<S: StagingShard>(&self, id: &[u8]) -> StoreResult<Option<&S>> {
        match self.shards.get(id) {
            None => Ok(None),
            Some(shard) => shard
                .as_ref()
                .as_any()
                .downcast_ref::<S>()
                .map(Some)
                .ok_or_else(|| StoreError::InvalidParameter(format!("shard {} is registered with a different type", hex::encode(id)))),
        }
    }

    /// Drops all pending writes of one store. Returns whether a shard existed.
    pub fn unstage(&mut self, id: &[u8]) -> bool {
        self.shards.remove(id).is_some()
    }

    /// Whether any shard holds pending writes
    pub fn is_staged(&self) -> bool {
        self.shards.values().any(|shard| shard.is_staged())
    }

    /// Atomically writes every staged shard and then updates the store caches.
    /// On error nothing is published and the area is gone.
    pub fn commit(self, db: &DbManager) -> StoreResult<()> {
        let staged: Vec<Box<dyn StagingShard>> = self.shards.into_values().filter(|shard| shard.is_staged()).collect();
        if staged.is_empty() {
            trace!("nothing staged, skipping commit");
            return Ok(());
        }

        let mut tx = db.begin();
        for shard in staged.iter() {
            shard.commit(&mut tx)?;
        }
        let ops = tx.len();
        tx.write()?;

        // Caches are updated while the gate is still held by `tx`
        let shards = staged.len();
        for shard in staged {
            shard.publish();
        }
        drop(tx);

        debug!("committed {} shards ({} operations)", shards, ops);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::DbKey;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingShard {
        prefix: u8,
        values: Vec<u8>,
        published: Arc<AtomicUsize>,
    }

    impl StagingShard for CountingShard {
        fn commit(&self, tx: &mut DbTransaction) -> StoreResult<()> {
            for v in &self.values {
                tx.put(DbKey::new(&[self.prefix], [*v]), vec![*v]);
            }
            Ok(())
        }

        fn publish(self: Box<Self>) {
            self.published.fetch_add(1, Ordering::SeqCst);
        }

        fn is_staged(&self) -> bool {
            !self.values.is_empty()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct OtherShard;

    impl StagingShard for OtherShard {
        fn commit(&self, _tx: &mut DbTransaction) -> StoreResult<()> {
            Ok(())
        }

        fn publish(self: Box<Self>) {}

        fn is_staged(&self) -> bool {
            false
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn counting(prefix: u8, published: &Arc<AtomicUsize>) -> impl FnOnce() -> CountingShard + '_ {
        move || CountingShard { prefix, values: Vec::new(), published: published.clone() }
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let published = Arc::new(AtomicUsize::new(0));
        let mut staging = StagingArea::new();
        staging.get_or_create_shard(&[1], counting(1, &published)).unwrap().values.push(7);
        let shard = staging.get_or_create_shard(&[1], counting(1, &published)).unwrap();
        assert_eq!(shard.values, vec![7], "second access returns the same instance");
        assert!(staging.is_staged());
        assert_eq!(staging.shard::<CountingShard>(&[1]).unwrap().map(|s| s.values.len()), Some(1));
        assert!(staging.shard::<CountingShard>(&[2]).unwrap().is_none());
    }

    #[test]
    fn type_mismatch_is_invalid_parameter() {
        let published = Arc::new(AtomicUsize::new(0));
        let mut staging = StagingArea::new();
        staging.get_or_create_shard(&[1], counting(1, &published)).unwrap();
        assert!(matches!(staging.get_or_create_shard(&[1], || OtherShard), Err(StoreError::InvalidParameter(_))));
        assert!(matches!(staging.shard::<OtherShard>(&[1]), Err(StoreError::InvalidParameter(_))));
    }

    #[test]
    fn unstage_drops_pending_writes() {
        let published = Arc::new(AtomicUsize::new(0));
        let mut staging = StagingArea::new();
        staging.get_or_create_shard(&[1], counting(1, &published)).unwrap().values.push(1);
        assert!(staging.unstage(&[1]));
        assert!(!staging.unstage(&[1]));
        assert!(!staging.is_staged());
    }

    #[test]
    fn commit_publishes_only_staged_shards_after_write() {
        use crate::backend::TestKvBackend;
        use crate::memory::MemoryDb;

        let mem = Arc::new(MemoryDb::new());
        let db = DbManager::new(mem.clone());
        let published = Arc::new(AtomicUsize::new(0));

        let mut staging = StagingArea::new();
        staging.get_or_create_shard(&[1], counting(1, &published)).unwrap().values.extend([1, 2]);
        staging.get_or_create_shard(&[2], counting(2, &published)).unwrap().values.push(3);
        staging.get_or_create_shard(&[3], counting(3, &published)).unwrap();
        mem.fail_next_write("boom");
        assert!(matches!(staging.commit(&db), Err(StoreError::Backend(_))));
        assert_eq!(published.load(Ordering::SeqCst), 0);
        assert!(mem.is_empty());

        let mut staging = StagingArea::new();
        staging.get_or_create_shard(&[1], counting(1, &published)).unwrap().values.extend([1, 2]);
        staging.get_or_create_shard(&[2], counting(2, &published)).unwrap().values.push(3);
        staging.get_or_create_shard(&[3], counting(3, &published)).unwrap();
        staging.commit(&db).unwrap();
        assert_eq!(published.load(Ordering::SeqCst), 2);
        assert_eq!(mem.len(), 3);
    }
}
