use thiserror::Error;

/// Failures of signature-hash computation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigHashError {
    #[error("input index {0} is out of range for a transaction with {1} inputs")]
    InputIndexOutOfRange(usize, usize),

    #[error("invalid sighash type {0:#04x}")]
    InvalidSigHashType(u8),

    #[error("transaction has {0} inputs but {1} UTXO entries were supplied")]
    UtxoEntryCountMismatch(usize, usize),
}

/// Failures loading consensus parameters
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameter {0}: {1}")]
    InvalidValue(&'static str, String),
}
