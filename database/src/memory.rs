use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};

use crate::backend::{KvBackend, TestKvBackend, WriteOp};
use crate::errors::{StoreError, StoreResult};

/// In-memory backend for tests. Supports injecting a failure into the next batch write.
#[derive(Default)]
pub struct MemoryDb {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryDb {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(StoreError::Backend(reason));
        }
        let mut map = self.map.write();
        for op in ops {
            match op {
                WriteOp::Put(key, value) => {
                    map.insert(key, value);
                }
                WriteOp::Delete(key) => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn count_prefix(&self, prefix: &[u8]) -> StoreResult<usize> {
        Ok(self.map.read().range(prefix.to_vec()..).take_while(|(k, _)| k.starts_with(prefix)).count())
    }
}

impl TestKvBackend for MemoryDb {
    fn fail_next_write(&self, reason: &str) {
        *self.fail_next.lock() = Some(reason.to_string());
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }
}
