use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{hashing, BlockLevel, BlueWorkType, Hash};

/// Block header. `hash` caches the header hash and is refreshed by [`Header::finalize`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Cached hash
    pub hash: Hash,
    pub version: u16,
    /// Parents per DAG level; level 0 holds the direct parents
    pub parents_by_level: Vec<Vec<Hash>>,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    /// Timestamp is in milliseconds
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub daa_score: u64,
    pub blue_work: BlueWorkType,
    pub blue_score: u64,
    pub pruning_point: Hash,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new_finalized(
        version: u16,
        parents_by_level: Vec<Vec<Hash>>,
        hash_merkle_root: Hash,
        accepted_id_merkle_root: Hash,
        utxo_commitment: Hash,
        timestamp: u64,
        bits: u32,
        nonce: u64,
        daa_score: u64,
        blue_work: BlueWorkType,
        blue_score: u64,
        pruning_point: Hash,
    ) -> Self {
        let mut header = Self {
            hash: Default::default(), // Temp init before the finalize below
            version,
            parents_by_level,
            hash_merkle_root,
            accepted_id_merkle_root,
            utxo_commitment,
            timestamp,
            bits,
            nonce,
            daa_score,
            blue_work,
            blue_score,
            pruning_point,
        };
        header.finalize();
        header
    }

    /// Finalizes the header and recomputes the header hash
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }

    pub fn direct_parents(&self) -> &[Hash] {
        self.parents_at_level(0)
    }

    /// Parents at `level`; empty when the header does not reference that level
    pub fn parents_at_level(&self, level: BlockLevel) -> &[Hash] {
        self.parents_by_level.get(level as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// WARNING: To be used for test purposes only
    pub fn from_precomputed_hash(hash: Hash, parents: Vec<Hash>) -> Header {
        Self::from_precomputed_hash_with_bits(hash, parents, crate::constants::MIN_DIFFICULTY_BITS)
    }

    /// WARNING: To be used for test purposes only
    pub fn from_precomputed_hash_with_bits(hash: Hash, parents: Vec<Hash>, bits: u32) -> Header {
        Header {
            version: crate::constants::BLOCK_VERSION,
            hash,
            parents_by_level: if parents.is_empty() { vec![] } else { vec![parents] },
            hash_merkle_root: Default::default(),
            accepted_id_merkle_root: Default::default(),
            utxo_commitment: Default::default(),
            nonce: 0,
            timestamp: 0,
            daa_score: 0,
            bits,
            blue_work: BlueWorkType::ZERO,
            blue_score: 0,
            pruning_point: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_by_level_accessors() {
        let header = Header::new_finalized(
            1,
            vec![vec![Hash::from_u64_word(1), Hash::from_u64_word(2)], vec![Hash::from_u64_word(3)]],
            Hash::default(),
            Hash::default(),
            Hash::default(),
            0,
            0x1f00ffff,
            0,
            0,
            BlueWorkType::ZERO,
            0,
            Hash::default(),
        );
        assert_eq!(header.direct_parents(), &[Hash::from_u64_word(1), Hash::from_u64_word(2)]);
        assert_eq!(header.parents_at_level(1), &[Hash::from_u64_word(3)]);
        assert!(header.parents_at_level(5).is_empty());
    }

    #[test]
    fn precomputed_genesis_has_no_parents() {
        let genesis = Header::from_precomputed_hash(Hash::from_u64_word(1), vec![]);
        assert!(genesis.parents_by_level.is_empty());
        assert!(genesis.direct_parents().is_empty());
        assert_eq!(genesis.hash, Hash::from_u64_word(1));
    }
}
