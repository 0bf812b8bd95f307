//! Consensus library for BlockDAG-based blockchain
//!
//! This library implements the core consensus state engine using the GHOSTDAG
//! algorithm: DAG relations, reachability queries and the header pipeline that
//! connects blocks atomically.

pub mod consensus;
pub mod errors;
pub mod pipeline;

// Re-export key types for easier access
pub use consensus::dag::{ReachabilityManager, RelationsManager};
pub use consensus::ghostdag::GhostdagProtocol;
pub use consensus::{BlockProcessingResult, CacheSizes, Consensus, ConsensusConfig, ConsensusStorage, PastMedianTimeManager};
pub use consensus_core::Hash;
pub use errors::{BlockProcessResult, GhostdagError, ReachabilityError, RuleError};
pub use pipeline::{BlockProcessor, HeaderProcessor};
