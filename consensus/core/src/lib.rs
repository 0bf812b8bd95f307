//! Core consensus types shared by the storage layer and the consensus engine:
//! transactions, headers, GHOSTDAG/reachability/relations records, consensus hashing
//! and network parameters.

use std::collections::{HashMap, HashSet};

pub mod config;
pub mod constants;
pub mod errors;
pub mod ghostdag;
pub mod hashing;
pub mod header;
pub mod reachability;
pub mod relations;
pub mod subnets;
pub mod tx;
pub mod utxo;
pub mod work;

pub use coinsec_hashes::{Hash, HASH_SIZE, ZERO_HASH};

/// Accumulated proof-of-work of blue blocks
pub type BlueWorkType = coinsec_math::Uint192;

/// Type of the GHOSTDAG K parameter and of anticone sizes bounded by it
pub type KType = u16;

/// DAG level of a block (level 0 is the plain block DAG)
pub type BlockLevel = u8;

pub type BlockHashMap<V> = HashMap<Hash, V>;
pub type BlockHashSet = HashSet<Hash>;

pub trait BlockHashExtensions {
    /// Whether this hash may be used to identify a stored block
    fn is_valid_key(&self) -> bool;
}

impl BlockHashExtensions for Hash {
    fn is_valid_key(&self) -> bool {
        !self.is_zero()
    }
}
