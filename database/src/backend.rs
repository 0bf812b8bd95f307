use crate::errors::StoreResult;

/// A single mutation inside an atomic batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// The persistent key/value boundary: point lookups and atomic batch writes
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.write_batch(vec![WriteOp::Put(key.to_vec(), value.to_vec())])
    }

    /// Applies all operations or none of them
    fn write_batch(&self, ops: Vec<WriteOp>) -> StoreResult<()>;

    /// Number of keys starting with `prefix`
    fn count_prefix(&self, prefix: &[u8]) -> StoreResult<usize>;
}

/// Extra capabilities of backends used as test doubles
pub trait TestKvBackend: KvBackend {
    /// Makes the next `write_batch` fail without applying anything
    fn fail_next_write(&self, reason: &str);

    /// Total number of keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
