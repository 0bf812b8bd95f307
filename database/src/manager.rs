use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use crate::backend::{KvBackend, WriteOp};
use crate::errors::StoreResult;
use crate::key::DbKey;

/// Shared handle to the persistent store plus the commit gate.
///
/// Commits hold the gate exclusively from the batch write until every store cache
/// has been updated; cache fills and multi-key readers hold it shared.
#[derive(Clone)]
pub struct DbManager {
    backend: Arc<dyn KvBackend>,
    gate: Arc<RwLock<()>>,
}

impl DbManager {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend, gate: Arc::new(RwLock::new(())) }
    }

    pub fn get(&self, key: &DbKey) -> StoreResult<Option<Vec<u8>>> {
        self.backend.get(key.as_ref())
    }

    pub fn has(&self, key: &DbKey) -> StoreResult<bool> {
        self.backend.has(key.as_ref())
    }

    pub fn count_prefix(&self, prefix: &[u8]) -> StoreResult<usize> {
        self.backend.count_prefix(prefix)
    }

    /// Shared section excluding concurrent commits. Recursive, so a holder may
    /// keep reading through stores that take the gate themselves.
    pub fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read_recursive()
    }

    /// Opens an exclusive write transaction
    pub fn begin(&self) -> DbTransaction<'_> {
        DbTransaction { backend: self.backend.as_ref(), ops: Vec::new(), _guard: self.gate.write() }
    }
}

/// Buffers puts and deletes and writes them as one atomic batch.
/// The commit gate stays locked until the transaction is dropped.
pub struct DbTransaction<'a> {
    backend: &'a dyn KvBackend,
    ops: Vec<WriteOp>,
    _guard: RwLockWriteGuard<'a, ()>,
}

impl DbTransaction<'_> {
    pub fn put(&mut self, key: DbKey, value: Vec<u8>) {
        self.ops.push(WriteOp::Put(key.as_ref().to_vec(), value));
    }

    pub fn delete(&mut self, key: DbKey) {
        self.ops.push(WriteOp::Delete(key.as_ref().to_vec()));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn write(&mut self) -> StoreResult<()> {
        let ops = std::mem::take(&mut self.ops);
        trace!("writing transaction with {} operations", ops.len());
        self.backend.write_batch(ops)
    }
}
