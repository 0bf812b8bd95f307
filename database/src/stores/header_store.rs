use consensus_core::header::Header;
use consensus_core::Hash;
use serde::{Deserialize, Serialize};

use super::access::CachedDbAccess;
use super::block_key;
use crate::errors::StoreResult;
use crate::key::StorePrefix;
use crate::manager::DbManager;
use crate::staging::StagingArea;

/// The header fields read on hot paths, stored apart from the full header
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactHeaderData {
    pub bits: u32,
    pub timestamp: u64,
    pub daa_score: u64,
    pub blue_score: u64,
}

impl From<&Header> for CompactHeaderData {
    fn from(header: &Header) -> Self {
        Self { bits: header.bits, timestamp: header.timestamp, daa_score: header.daa_score, blue_score: header.blue_score }
    }
}

#[derive(Clone)]
pub struct HeaderStore {
    headers: CachedDbAccess<Hash, Header>,
    compact: CachedDbAccess<Hash, CompactHeaderData>,
}

impl HeaderStore {
    pub fn new(db: DbManager, cache_size: usize) -> Self {
        Self {
            headers: CachedDbAccess::new(db.clone(), cache_size, StorePrefix::Headers.as_bytes().to_vec()),
            compact: CachedDbAccess::new(db, cache_size, StorePrefix::HeadersCompact.as_bytes().to_vec()),
        }
    }

    pub fn stage(&self, staging: &mut StagingArea, header: &Header) -> StoreResult<()> {
        let hash = block_key(header.hash)?;
        self.compact.write(staging, hash, CompactHeaderData::from(header))?;
        self.headers.write(staging, hash, header.clone())
    }

    pub fn get(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Header> {
        self.headers.read(staging, &block_key(hash)?)
    }

    pub fn has(&self, staging: &StagingArea, hash: Hash) -> StoreResult<bool> {
        self.compact.has(staging, &block_key(hash)?)
    }

    pub fn get_compact(&self, staging: &StagingArea, hash: Hash) -> StoreResult<CompactHeaderData> {
        self.compact.read(staging, &block_key(hash)?)
    }

    pub fn get_bits(&self, staging: &StagingArea, hash: Hash) -> StoreResult<u32> {
        Ok(self.get_compact(staging, hash)?.bits)
    }

    pub fn get_timestamp(&self, staging: &StagingArea, hash: Hash) -> StoreResult<u64> {
        Ok(self.get_compact(staging, hash)?.timestamp)
    }

    pub fn get_daa_score(&self, staging: &StagingArea, hash: Hash) -> StoreResult<u64> {
        Ok(self.get_compact(staging, hash)?.daa_score)
    }

    /// Number of committed headers
    pub fn count(&self) -> StoreResult<usize> {
        self.headers.count_committed()
    }

    pub fn is_staged(&self, staging: &StagingArea) -> StoreResult<bool> {
        self.headers.is_staged(staging)
    }
}
