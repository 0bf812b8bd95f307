use crate::{BlockLevel, KType};

/// Current block version
pub const BLOCK_VERSION: u16 = 1;

/// Current transaction version
pub const TX_VERSION: u16 = 0;

/// GhostDAG K parameter - maximum number of blue blocks in the anticone of a blue block
pub const GHOSTDAG_K: KType = 18;

/// Maximum number of direct parents a block may reference
pub const MAX_BLOCK_PARENTS: usize = 10;

/// Highest DAG level tracked by the relations stores
pub const MAX_BLOCK_LEVEL: BlockLevel = 225;

/// Number of selected-chain blocks whose timestamps make up the past median time
pub const PAST_MEDIAN_TIME_WINDOW: usize = 11;

/// Minimum difficulty bits (maximum target)
pub const MIN_DIFFICULTY_BITS: u32 = 0x1f00_ffff;

/// Genesis block timestamp
pub const GENESIS_BLOCK_TIMESTAMP: u64 = 1699545600000;

/// Sequence number marking an input as final
pub const MAX_TX_IN_SEQUENCE_NUM: u64 = u64::MAX;
