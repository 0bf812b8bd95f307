//! Signature hashes over populated transactions.
//!
//! The intermediate hashes shared by every input of a transaction (previous outpoints,
//! sequences, sig-op counts, outputs and payload) are memoized in a caller-owned
//! [`SigHashReusedValues`], so hashing all inputs of one transaction stays linear.

use coinsec_hashes::{HasherBase, TransactionSigningHash, TransactionSigningHashECDSA, ZERO_HASH};

use crate::{
    errors::SigHashError,
    tx::{ScriptPublicKey, TransactionOutpoint, TransactionOutput, VerifiableTransaction},
    Hash,
};

use super::{sighash_type::SigHashType, HasherExtensions};

/// Holds all fields used in the calculation of a transaction's sig_hash which are
/// the same for all transaction inputs.
/// Reuse of such values prevents the quadratic hashing problem.
#[derive(Default)]
pub struct SigHashReusedValues {
    previous_outputs_hash: Option<Hash>,
    sequences_hash: Option<Hash>,
    sig_op_counts_hash: Option<Hash>,
    outputs_hash: Option<Hash>,
    payload_hash: Option<Hash>,
}

impl SigHashReusedValues {
    pub fn new() -> Self {
        Self::default()
    }
}

fn previous_outputs_hash(tx: &impl VerifiableTransaction, hash_type: SigHashType, reused_values: &mut SigHashReusedValues) -> Hash {
    if hash_type.is_sighash_anyone_can_pay() {
        return ZERO_HASH;
    }

    if let Some(previous_outputs_hash) = reused_values.previous_outputs_hash {
        previous_outputs_hash
    } else {
        let mut hasher = TransactionSigningHash::new();
        for input in tx.inputs().iter() {
            hasher.update(input.previous_outpoint.transaction_id);
            hasher.write_u32(input.previous_outpoint.index);
        }
        let previous_outputs_hash = hasher.finalize();
        reused_values.previous_outputs_hash = Some(previous_outputs_hash);
        previous_outputs_hash
    }
}

fn sequences_hash(tx: &impl VerifiableTransaction, hash_type: SigHashType, reused_values: &mut SigHashReusedValues) -> Hash {
    if hash_type.is_sighash_single() || hash_type.is_sighash_anyone_can_pay() || hash_type.is_sighash_none() {
        return ZERO_HASH;
    }

    if let Some(sequences_hash) = reused_values.sequences_hash {
        sequences_hash
    } else {
        let mut hasher = TransactionSigningHash::new();
        for input in tx.inputs().iter() {
            hasher.write_u64(input.sequence);
        }
        let sequences_hash = hasher.finalize();
        reused_values.sequences_hash = Some(sequences_hash);
        sequences_hash
    }
}

fn sig_op_counts_hash(tx: &impl VerifiableTransaction, hash_type: SigHashType, reused_values: &mut SigHashReusedValues) -> Hash {
    if hash_type.is_sighash_anyone_can_pay() {
        return ZERO_HASH;
    }

    if let Some(sig_op_counts_hash) = reused_values.sig_op_counts_hash {
        sig_op_counts_hash
    } else {
        let mut hasher = TransactionSigningHash::new();
        for input in tx.inputs().iter() {
            hasher.write_u8(input.sig_op_count);
        }
        let sig_op_counts_hash = hasher.finalize();
        reused_values.sig_op_counts_hash = Some(sig_op_counts_hash);
        sig_op_counts_hash
    }
}

fn payload_hash(tx: &impl VerifiableTransaction, reused_values: &mut SigHashReusedValues) -> Hash {
    if tx.tx().subnetwork_id.is_native() {
        return ZERO_HASH;
    }

    if let Some(payload_hash) = reused_values.payload_hash {
        payload_hash
    } else {
        let mut hasher = TransactionSigningHash::new();
        hasher.write_var_bytes(&tx.tx().payload);
        let payload_hash = hasher.finalize();
        reused_values.payload_hash = Some(payload_hash);
        payload_hash
    }
}

fn outputs_hash(tx: &impl VerifiableTransaction, hash_type: SigHashType, reused_values: &mut SigHashReusedValues, input_index: usize) -> Hash {
    if hash_type.is_sighash_none() {
        return ZERO_HASH;
    }

    if hash_type.is_sighash_single() {
        // If the relevant output exists - return its hash, otherwise return zero-hash
        if input_index >= tx.outputs().len() {
            return ZERO_HASH;
        }

        let mut hasher = TransactionSigningHash::new();
        hash_output(&mut hasher, &tx.outputs()[input_index]);
        return hasher.finalize();
    }

    // Otherwise, return hash of all outputs. Re-use hash if available.
    if let Some(outputs_hash) = reused_values.outputs_hash {
        outputs_hash
    } else {
        let mut hasher = TransactionSigningHash::new();
        for output in tx.outputs().iter() {
            hash_output(&mut hasher, output);
        }
        let outputs_hash = hasher.finalize();
        reused_values.outputs_hash = Some(outputs_hash);
        outputs_hash
    }
}

fn hash_outpoint(hasher: &mut impl HasherBase, outpoint: TransactionOutpoint) {
    hasher.update(outpoint.transaction_id);
    hasher.write_u32(outpoint.index);
}

fn hash_output(hasher: &mut impl HasherBase, output: &TransactionOutput) {
    hasher.write_u64(output.value);
    hash_script_public_key(hasher, &output.script_public_key);
}

fn hash_script_public_key(hasher: &mut impl HasherBase, script_public_key: &ScriptPublicKey) {
    hasher.write_u16(script_public_key.version());
    hasher.write_var_bytes(script_public_key.script());
}

/// Computes the Schnorr signature hash of input `input_index` under `hash_type`
pub fn calc_schnorr_signature_hash(
    verifiable_tx: &impl VerifiableTransaction,
    input_index: usize,
    hash_type: SigHashType,
    reused_values: &mut SigHashReusedValues,
) -> Result<Hash, SigHashError> {
    let input_count = verifiable_tx.inputs().len();
    if input_index >= input_count {
        return Err(SigHashError::InputIndexOutOfRange(input_index, input_count));
    }

    let input = verifiable_tx.populated_input(input_index);
    let tx = verifiable_tx.tx();
    let mut hasher = TransactionSigningHash::new();
    hasher
        .write_u16(tx.version)
        .update(previous_outputs_hash(verifiable_tx, hash_type, reused_values))
        .update(sequences_hash(verifiable_tx, hash_type, reused_values))
        .update(sig_op_counts_hash(verifiable_tx, hash_type, reused_values));
    hash_outpoint(&mut hasher, input.0.previous_outpoint);
    hash_script_public_key(&mut hasher, &input.1.script_public_key);
    hasher
        .write_u64(input.1.amount)
        .write_u64(input.0.sequence)
        .write_u8(input.0.sig_op_count)
        .update(outputs_hash(verifiable_tx, hash_type, reused_values, input_index))
        .write_u64(tx.lock_time)
        .update(tx.subnetwork_id)
        .write_u64(tx.gas)
        .update(payload_hash(verifiable_tx, reused_values))
        .write_u8(hash_type.to_u8());
    Ok(hasher.finalize())
}

/// ECDSA signatures sign a SHA-256 digest of the Schnorr signature hash
pub fn calc_ecdsa_signature_hash(
    tx: &impl VerifiableTransaction,
    input_index: usize,
    hash_type: SigHashType,
    reused_values: &mut SigHashReusedValues,
) -> Result<Hash, SigHashError> {
    let hash = calc_schnorr_signature_hash(tx, input_index, hash_type, reused_values)?;
    let mut hasher = TransactionSigningHashECDSA::new();
    hasher.update(hash);
    Ok(hasher.finalize())
}
