pub mod access;
pub mod ghostdag_store;
pub mod header_store;
pub mod reachability_store;
pub mod relations_store;
pub mod utxo_store;

pub use access::{CachedDbAccess, StoreKey, StoreShard};
pub use ghostdag_store::{GhostdagKey, GhostdagStore};
pub use header_store::{CompactHeaderData, HeaderStore};
pub use reachability_store::ReachabilityStore;
pub use relations_store::RelationsStore;
pub use utxo_store::UtxoSetStore;

use consensus_core::{BlockHashExtensions, Hash};

use crate::errors::{StoreError, StoreResult};

/// Rejects hashes that cannot identify a stored block
pub(crate) fn block_key(hash: Hash) -> StoreResult<Hash> {
    if hash.is_valid_key() {
        Ok(hash)
    } else {
        Err(StoreError::InvalidParameter("zero hash used as a block key".to_string()))
    }
}
