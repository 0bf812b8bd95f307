use thiserror::Error;

use crate::key::DbKey;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key {0} not found in store")]
    KeyNotFound(DbKey),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait StoreResultExtensions<T> {
    /// Maps a missing key to `None`, keeping every other error
    fn optional(self) -> StoreResult<Option<T>>;
}

impl<T> StoreResultExtensions<T> for StoreResult<T> {
    fn optional(self) -> StoreResult<Option<T>> {
        match self {
            Ok(data) => Ok(Some(data)),
            Err(StoreError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::StorePrefix;

    #[test]
    fn optional_only_swallows_missing_keys() {
        let missing: StoreResult<u8> = Err(StoreError::KeyNotFound(DbKey::new(StorePrefix::Headers.as_bytes(), [1u8])));
        assert!(matches!(missing.optional(), Ok(None)));

        let found: StoreResult<u8> = Ok(3);
        assert!(matches!(found.optional(), Ok(Some(3))));

        let broken: StoreResult<u8> = Err(StoreError::Backend("disk".to_string()));
        assert!(matches!(broken.optional(), Err(StoreError::Backend(_))));
    }
}
