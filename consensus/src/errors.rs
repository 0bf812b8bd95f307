//! Error types of the consensus layer

use consensus_core::errors::ConfigError;
use consensus_core::{BlockLevel, Hash};
use database::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReachabilityError {
    #[error("{0}")]
    Store(#[from] StoreError),

    /// No ancestor interval is large enough to host the tree
    #[error("reachability interval space is exhausted")]
    IntervalExhausted,

    #[error("block {0} has no reachability data")]
    MissingBlock(Hash),
}

pub type ReachabilityResult<T> = Result<T, ReachabilityError>;

#[derive(Error, Debug)]
pub enum GhostdagError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Reachability(#[from] ReachabilityError),

    #[error("missing GHOSTDAG data or relations for parent {0}")]
    MissingParentData(Hash),

    #[error("block {0} has no parents")]
    NoParents(Hash),

    #[error("block {0} is not in the blue set of its selected chain")]
    NotInBlueSet(Hash),
}

pub type GhostdagResult<T> = Result<T, GhostdagError>;

/// Reasons a block is rejected, plus the fatal failures of the engine itself
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("block {0} is already known")]
    DuplicateBlock(Hash),

    #[error("block {0} has no parents")]
    NoParents(Hash),

    #[error("block {0} lists itself as a parent")]
    CyclicParent(Hash),

    #[error("block hash is the zero hash")]
    ZeroBlockHash,

    #[error("block {0} lists the zero hash as a parent at level {1}")]
    ZeroParent(Hash, BlockLevel),

    #[error("block {0} lists parent {1} more than once at level {2}")]
    DuplicateParent(Hash, Hash, BlockLevel),

    #[error("block has {0} parents, at most {1} are allowed")]
    TooManyParents(usize, usize),

    #[error("block level {0} exceeds the maximum of {1}")]
    InvalidBlockLevel(u8, u8),

    #[error("missing parents {0:?}")]
    MissingParents(Vec<Hash>),

    #[error("genesis {0} does not match the configured genesis {1}")]
    UnexpectedGenesis(Hash, Hash),

    #[error("block processor is shut down")]
    ProcessorShutdown,

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Reachability(#[from] ReachabilityError),

    #[error("{0}")]
    Ghostdag(#[from] GhostdagError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl RuleError {
    /// Whether this error means the engine itself is broken, as opposed to a bad block
    pub fn is_fatal(&self) -> bool {
        match self {
            // Rejected input, not a broken store
            RuleError::Store(StoreError::InvalidParameter(_)) => false,
            RuleError::Store(_) | RuleError::Reachability(_) | RuleError::Ghostdag(_) => true,
            _ => false,
        }
    }
}

pub type BlockProcessResult<T> = Result<T, RuleError>;
