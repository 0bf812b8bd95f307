//! DAG structure for BlockDAG consensus
//!
//! This module provides:
//! - Block relationship tracking (parents/children per level)
//! - Interval-based reachability queries with reindexing

pub mod reachability;
pub mod relations;
mod reindex;
#[cfg(test)]
mod integration_test;

pub use reachability::ReachabilityManager;
pub use relations::RelationsManager;
