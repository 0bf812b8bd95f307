use super::HasherExtensions;
use crate::{header::Header, Hash};
use coinsec_hashes::{BlockHash, HasherBase};

/// Returns the header hash
pub fn hash(header: &Header) -> Hash {
    hash_override_nonce_time(header, header.nonce, header.timestamp)
}

/// Computes the header hash while allowing override of the nonce and timestamp fields.
/// Used by PoW routines which need the pre-pow hash (with time/nonce zeroed or overridden).
pub fn hash_override_nonce_time(header: &Header, nonce: u64, timestamp: u64) -> Hash {
    let mut hasher = BlockHash::new();
    hasher.write_u16(header.version).write_len(header.parents_by_level.len());
    for level in header.parents_by_level.iter() {
        hasher.write_var_array(level);
    }

    hasher
        .update(header.hash_merkle_root)
        .update(header.accepted_id_merkle_root)
        .update(header.utxo_commitment)
        .write_u64(timestamp)
        .write_u32(header.bits)
        .write_u64(nonce)
        .write_u64(header.daa_score)
        .update(header.blue_work.to_le_bytes())
        .write_u64(header.blue_score)
        .update(header.pruning_point);

    hasher.finalize()
}
