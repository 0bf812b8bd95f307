//! GHOSTDAG consensus implementation
//!
//! Selected parent choice, merge set discovery and the k-cluster blue/red
//! coloring of each new block.

pub mod mergeset;
pub mod ordering;
pub mod protocol;

pub use ordering::SortableBlock;
pub use protocol::GhostdagProtocol;
