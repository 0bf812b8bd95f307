//! Block processing pipeline for consensus
//!
//! The header processor connects one header as an atomic unit of work; the
//! block processor feeds it from a queue on a supervised worker thread.

pub mod block_processor;
pub mod header_processor;

pub use block_processor::{BlockProcessor, BlockResultReceiver, BlockTask};
pub use header_processor::HeaderProcessor;
