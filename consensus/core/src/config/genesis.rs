use serde::{Deserialize, Serialize};

use crate::{
    constants::{BLOCK_VERSION, GENESIS_BLOCK_TIMESTAMP, MIN_DIFFICULTY_BITS, TX_VERSION},
    header::Header,
    subnets::SUBNETWORK_ID_COINBASE,
    tx::{Transaction, TransactionOutput},
    BlueWorkType, Hash, ZERO_HASH,
};

/// The constants uniquely representing the genesis block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisBlock {
    pub version: u16,
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub daa_score: u64,
    pub coinbase_payload: Vec<u8>,
}

impl Default for GenesisBlock {
    fn default() -> Self {
        Self {
            version: BLOCK_VERSION,
            timestamp: GENESIS_BLOCK_TIMESTAMP,
            bits: MIN_DIFFICULTY_BITS,
            nonce: 0,
            daa_score: 0,
            coinbase_payload: b"coinsec genesis".to_vec(),
        }
    }
}

impl GenesisBlock {
    /// The genesis coinbase: no inputs, no outputs, only the payload
    pub fn build_genesis_transactions(&self) -> Vec<Transaction> {
        vec![Transaction::new(
            TX_VERSION,
            Vec::new(),
            Vec::<TransactionOutput>::new(),
            0,
            SUBNETWORK_ID_COINBASE,
            0,
            self.coinbase_payload.clone(),
        )]
    }

    /// The genesis header. With a single coinbase the merkle root is the coinbase hash itself.
    pub fn header(&self) -> Header {
        let merkle_root = self.build_genesis_transactions().first().map(Transaction::hash).unwrap_or_default();
        Header::new_finalized(
            self.version,
            Vec::new(),
            merkle_root,
            ZERO_HASH,
            ZERO_HASH,
            self.timestamp,
            self.bits,
            self.nonce,
            self.daa_score,
            BlueWorkType::ZERO,
            0,
            ZERO_HASH,
        )
    }

    pub fn hash(&self) -> Hash {
        self.header().hash
    }
}

impl From<&GenesisBlock> for Header {
    fn from(genesis: &GenesisBlock) -> Self {
        genesis.header()
    }
}
