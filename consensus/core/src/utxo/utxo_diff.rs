use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::tx::{TransactionOutpoint, UtxoEntry, VerifiableTransaction};

/// Represents the changes caused by applying transactions to the UTXO set.
/// `removed` holds the consumed entries (kept for undo), `added` the newly created ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize, PartialEq, Eq)]
pub struct UtxoDiff {
    pub added: Vec<(TransactionOutpoint, UtxoEntry)>,
    pub removed: Vec<(TransactionOutpoint, UtxoEntry)>,
}

impl UtxoDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spends the inputs of `tx` and creates its outputs at `block_daa_score`.
    /// Outputs created earlier in this same diff are cancelled out rather than recorded as removed.
    pub fn add_transaction(&mut self, tx: &impl VerifiableTransaction, block_daa_score: u64) {
        for (input, entry) in tx.populated_inputs() {
            let outpoint = input.previous_outpoint;
            if let Some(pos) = self.added.iter().position(|(op, _)| *op == outpoint) {
                self.added.swap_remove(pos);
            } else {
                self.removed.push((outpoint, entry.clone()));
            }
        }

        let id = tx.id();
        let is_coinbase = tx.is_coinbase();
        for (index, output) in tx.outputs().iter().enumerate() {
            let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), block_daa_score, is_coinbase);
            self.added.push((TransactionOutpoint::new(id, index as u32), entry));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
