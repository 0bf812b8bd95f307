//! Block processor for consensus
//!
//! A supervised worker thread consuming a queue of headers in submission order.
//! Each task gets its own reply; a fatal engine failure stops the worker and is
//! reported through the supervised task's error channel.

use std::sync::Arc;

use coinsec_utils::task::{SupervisedTask, TaskError};
use consensus_core::header::Header;
use consensus_core::BlockLevel;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{error, trace, Span};

use super::header_processor::HeaderProcessor;
use crate::consensus::types::BlockProcessingResult;
use crate::errors::{BlockProcessResult, RuleError};

pub type BlockResultReceiver = Receiver<BlockProcessResult<BlockProcessingResult>>;

pub struct BlockTask {
    pub header: Header,
    pub level: BlockLevel,
    pub result_sender: Sender<BlockProcessResult<BlockProcessingResult>>,
}

pub struct BlockProcessor {
    sender: Option<Sender<BlockTask>>,
    task: SupervisedTask<RuleError>,
}

impl BlockProcessor {
    /// Starts the worker thread
    pub fn spawn(processor: Arc<HeaderProcessor>) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded::<BlockTask>();
        let span = tracing::info_span!("block_processor", genesis = %processor.genesis_hash());
        let task = SupervisedTask::spawn("block-processor", move || worker(processor, receiver, span))?;
        Ok(Self { sender: Some(sender), task })
    }

    /// Queues a header and returns the channel its result will arrive on
    pub fn submit(&self, header: Header, level: BlockLevel) -> BlockProcessResult<BlockResultReceiver> {
        let sender = self.sender.as_ref().ok_or(RuleError::ProcessorShutdown)?;
        let (result_sender, result_receiver) = bounded(1);
        sender.send(BlockTask { header, level, result_sender }).map_err(|_| RuleError::ProcessorShutdown)?;
        Ok(result_receiver)
    }

    /// Queues a header and waits for its result
    pub fn process(&self, header: Header, level: BlockLevel) -> BlockProcessResult<BlockProcessingResult> {
        self.submit(header, level)?.recv().map_err(|_| RuleError::ProcessorShutdown)?
    }

    /// The fatal failure that stopped the worker, if it has stopped
    pub fn try_error(&self) -> Option<TaskError<RuleError>> {
        self.task.try_error()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Closes the queue, lets the worker drain it and surfaces its failure, if any
    pub fn shutdown(mut self) -> Result<(), TaskError<RuleError>> {
        self.sender.take();
        self.task.join()
    }
}

fn worker(processor: Arc<HeaderProcessor>, receiver: Receiver<BlockTask>, span: Span) -> Result<(), RuleError> {
    let _enter = span.enter();
    for task in receiver.iter() {
        let hash = task.header.hash;
        match processor.process_header(&task.header, task.level) {
            Err(err) if err.is_fatal() => {
                error!("fatal error while processing {}: {}", hash, err);
                let _ = task.result_sender.send(Err(RuleError::ProcessorShutdown));
                return Err(err);
            }
            result => {
                trace!("processed {}", hash);
                // The submitter may have stopped waiting
                let _ = task.result_sender.send(result);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::storage::ConsensusStorage;
    use crate::consensus::types::CacheSizes;
    use consensus_core::config::params::Params;
    use consensus_core::{Hash, ZERO_HASH};

    fn setup() -> (BlockProcessor, Hash) {
        let params = Params::devnet();
        let storage = Arc::new(ConsensusStorage::in_memory(&CacheSizes::default(), 0));
        let processor = Arc::new(HeaderProcessor::new(&params, storage));
        let genesis = params.genesis.header();
        processor.init_genesis(&genesis).unwrap();
        (BlockProcessor::spawn(processor).unwrap(), genesis.hash)
    }

    #[test]
    fn processes_in_submission_order() {
        let (processor, genesis) = setup();
        let mut receivers = Vec::new();
        let mut parent = genesis;
        for i in 1..=20u64 {
            let hash = Hash::from_u64_word(i);
            receivers.push(processor.submit(Header::from_precomputed_hash(hash, vec![parent]), 0).unwrap());
            parent = hash;
        }
        for (i, receiver) in receivers.into_iter().enumerate() {
            let result = receiver.recv().unwrap().unwrap();
            assert_eq!(result.blue_score, i as u64 + 1);
        }
        assert!(processor.is_running());
        assert!(processor.shutdown().is_ok());
    }

    #[test]
    fn validation_errors_do_not_stop_the_worker() {
        let (processor, genesis) = setup();
        let orphan = Header::from_precomputed_hash(Hash::from_u64_word(5), vec![Hash::from_u64_word(4)]);
        assert!(matches!(processor.process(orphan, 0), Err(RuleError::MissingParents(_))));

        let child = Header::from_precomputed_hash(Hash::from_u64_word(6), vec![genesis]);
        assert_eq!(processor.process(child.clone(), 0).unwrap().selected_parent, genesis);
        assert!(matches!(processor.process(child, 0), Err(RuleError::DuplicateBlock(_))));

        assert!(processor.try_error().is_none());
        assert!(processor.shutdown().is_ok());
    }

    #[test]
    fn malformed_headers_do_not_stop_the_worker() {
        let (processor, genesis) = setup();
        let zero_parent = Header::from_precomputed_hash(Hash::from_u64_word(7), vec![genesis, ZERO_HASH]);
        assert!(matches!(processor.process(zero_parent, 0), Err(RuleError::ZeroParent(..))));
        let zero_hash = Header::from_precomputed_hash(ZERO_HASH, vec![genesis]);
        assert!(matches!(processor.process(zero_hash, 0), Err(RuleError::ZeroBlockHash)));

        let child = Header::from_precomputed_hash(Hash::from_u64_word(8), vec![genesis]);
        assert_eq!(processor.process(child, 0).unwrap().blue_score, 1);
        assert!(processor.is_running());
        assert!(processor.try_error().is_none());
        assert!(processor.shutdown().is_ok());
    }
}
