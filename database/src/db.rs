use crate::backend::{KvBackend, WriteOp};
use crate::errors::StoreResult;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// RocksDB-backed persistent store. All logical stores share the default column
/// family and are separated by key prefixes.
pub struct Database {
    db: Arc<DB>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(10000);
        opts.set_keep_log_file_num(10);
        opts.set_max_background_jobs(4);
        opts.set_bytes_per_sync(1048576);
        opts.increase_parallelism(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);

        let db = DB::open(&opts, path.as_ref())?;
        info!("opened database at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }

    pub fn stats(&self) -> String {
        self.db.property_value("rocksdb.stats").unwrap_or_default().unwrap_or_default()
    }

    pub fn compact(&self) {
        self.db.compact_range(None::<&[u8]>, None::<&[u8]>);
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl KvBackend for Database {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.db.get_pinned(key)?.is_some())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        let mut batch = WriteBatch::default();
        let count = ops.len();
        for op in ops {
            match op {
                WriteOp::Put(key, value) => batch.put(key, value),
                WriteOp::Delete(key) => batch.delete(key),
            }
        }
        self.db.write(batch)?;
        debug!("wrote batch of {} operations", count);
        Ok(())
    }

    fn count_prefix(&self, prefix: &[u8]) -> StoreResult<usize> {
        let mut count = 0usize;
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_open_put_get() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        db.put(b"k", b"v").unwrap();
        let v = db.get(b"k").unwrap();
        assert_eq!(v, Some(b"v".to_vec()));
        assert!(db.has(b"k").unwrap());
        assert!(!db.has(b"x").unwrap());
    }

    #[test]
    fn test_batch_and_prefix_count() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        db.write_batch(vec![
            WriteOp::Put(vec![1, 1], vec![0]),
            WriteOp::Put(vec![1, 2], vec![0]),
            WriteOp::Put(vec![2, 1], vec![0]),
        ])
        .unwrap();
        assert_eq!(db.count_prefix(&[1]).unwrap(), 2);

        db.write_batch(vec![WriteOp::Delete(vec![1, 1])]).unwrap();
        assert_eq!(db.count_prefix(&[1]).unwrap(), 1);
        assert_eq!(db.count_prefix(&[2]).unwrap(), 1);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = TempDir::new().unwrap();
        {
            let db = Database::open(tmp.path()).unwrap();
            db.put(b"persist", b"me").unwrap();
        }
        let db = Database::open(tmp.path()).unwrap();
        assert_eq!(db.get(b"persist").unwrap(), Some(b"me".to_vec()));
    }
}
