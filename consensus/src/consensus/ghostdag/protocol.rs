use consensus_core::ghostdag::GhostdagData;
use consensus_core::work::calc_work;
use consensus_core::{BlockHashMap, BlueWorkType, Hash, KType};
use database::prelude::*;
use tracing::{debug, trace, Span};

use super::ordering::{selected_parent_order, SortableBlock};
use crate::consensus::dag::ReachabilityManager;
use crate::errors::{GhostdagError, GhostdagResult};

/// The k-cluster ordering of the DAG
#[derive(Clone)]
pub struct GhostdagProtocol {
    k: KType,
    genesis_hash: Hash,
    ghostdag_store: GhostdagStore,
    pub(super) relations: RelationsStore,
    headers: HeaderStore,
    pub(super) reachability: ReachabilityManager,
    span: Span,
}

enum ColoringState {
    Blue,
    Red,
    Pending,
}

enum ColoringOutput {
    Blue(KType, BlockHashMap<KType>),
    Red,
}

impl GhostdagProtocol {
    pub fn new(
        k: KType,
        genesis_hash: Hash,
        ghostdag_store: GhostdagStore,
        relations: RelationsStore,
        headers: HeaderStore,
        reachability: ReachabilityManager,
    ) -> Self {
        Self { k, genesis_hash, ghostdag_store, relations, headers, reachability, span: tracing::debug_span!("ghostdag", k) }
    }

    pub fn k(&self) -> KType {
        self.k
    }

    pub fn genesis_ghostdag_data(&self) -> GhostdagData {
        GhostdagData::genesis()
    }

    pub(super) fn data(&self, staging: &StagingArea, hash: Hash) -> GhostdagResult<GhostdagData> {
        self.ghostdag_store.get(staging, hash, false).optional()?.ok_or(GhostdagError::MissingParentData(hash))
    }

    pub(super) fn blue_work(&self, staging: &StagingArea, hash: Hash) -> GhostdagResult<BlueWorkType> {
        Ok(self.data(staging, hash)?.blue_work)
    }

    /// The parent with the most blue work; ties go to the lowest hash
    pub fn find_selected_parent(&self, staging: &StagingArea, parents: &[Hash]) -> GhostdagResult<Option<Hash>> {
        let mut candidates = Vec::with_capacity(parents.len());
        for parent in parents {
            candidates.push(SortableBlock::new(*parent, self.blue_work(staging, *parent)?));
        }
        Ok(candidates.into_iter().max_by(selected_parent_order).map(|block| block.hash))
    }

    /// Runs the GHOSTDAG protocol for a new block with the given parents
    pub fn ghostdag(&self, staging: &StagingArea, block: Hash, parents: &[Hash]) -> GhostdagResult<GhostdagData> {
        let _enter = self.span.enter();
        let selected_parent = self.find_selected_parent(staging, parents)?.ok_or(GhostdagError::NoParents(block))?;
        let mut new_block_data = GhostdagData::new_with_selected_parent(selected_parent, self.k);

        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(staging, selected_parent, parents)?;
        for blue_candidate in ordered_mergeset {
            match self.check_blue_candidate(staging, &new_block_data, blue_candidate)? {
                ColoringOutput::Blue(blue_anticone_size, blues_anticone_sizes) => {
                    new_block_data.add_blue(blue_candidate, blue_anticone_size, &blues_anticone_sizes);
                }
                ColoringOutput::Red => new_block_data.add_red(blue_candidate),
            }
        }

        let selected_parent_data = self.data(staging, selected_parent)?;
        let blue_score = selected_parent_data.blue_score + new_block_data.mergeset_blues.len() as u64;

        let mut added_blue_work = BlueWorkType::ZERO;
        for blue in new_block_data.mergeset_blues.iter() {
            let bits = self.headers.get_bits(staging, *blue).optional()?.ok_or(GhostdagError::MissingParentData(*blue))?;
            added_blue_work = added_blue_work + calc_work(bits);
        }
        let blue_work = selected_parent_data.blue_work + added_blue_work;
        new_block_data.finalize_score_and_work(blue_score, blue_work);

        debug!(
            "block {} selected parent {} blue score {} ({} blues, {} reds)",
            block,
            selected_parent,
            blue_score,
            new_block_data.mergeset_blues.len(),
            new_block_data.mergeset_reds.len()
        );
        Ok(new_block_data)
    }

    fn check_blue_candidate(&self, staging: &StagingArea, new_block_data: &GhostdagData, blue_candidate: Hash) -> GhostdagResult<ColoringOutput> {
        // The selected parent is always blue, so at most K more blues fit
        if new_block_data.mergeset_blues.len() as KType == self.k + 1 {
            trace!("{} is red: merge set already holds K+1 blues", blue_candidate);
            return Ok(ColoringOutput::Red);
        }

        let mut candidate_blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(self.k as usize);
        let mut candidate_blue_anticone_size: KType = 0;

        // Walk the selected chain starting from the new block itself
        let mut state = self.check_blue_candidate_with_chain_block(
            staging,
            new_block_data,
            None,
            &new_block_data.mergeset_blues,
            blue_candidate,
            &mut candidate_blues_anticone_sizes,
            &mut candidate_blue_anticone_size,
        )?;
        let mut chain_hash = new_block_data.selected_parent;
        loop {
            match state {
                ColoringState::Blue => return Ok(ColoringOutput::Blue(candidate_blue_anticone_size, candidate_blues_anticone_sizes)),
                ColoringState::Red => return Ok(ColoringOutput::Red),
                ColoringState::Pending => {}
            }
            let chain_data = self.data(staging, chain_hash)?;
            state = self.check_blue_candidate_with_chain_block(
                staging,
                new_block_data,
                Some(chain_hash),
                &chain_data.mergeset_blues,
                blue_candidate,
                &mut candidate_blues_anticone_sizes,
                &mut candidate_blue_anticone_size,
            )?;
            chain_hash = chain_data.selected_parent;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_blue_candidate_with_chain_block(
        &self,
        staging: &StagingArea,
        new_block_data: &GhostdagData,
        chain_block: Option<Hash>,
        chain_block_mergeset_blues: &[Hash],
        blue_candidate: Hash,
        candidate_blues_anticone_sizes: &mut BlockHashMap<KType>,
        candidate_blue_anticone_size: &mut KType,
    ) -> GhostdagResult<ColoringState> {
        // Once the candidate is in the future of a chain block, every remaining blue
        // is in its past. The new block itself is always in the candidate's future.
        if let Some(hash) = chain_block {
            if self.reachability.is_dag_ancestor_of(staging, hash, blue_candidate)? {
                return Ok(ColoringState::Blue);
            }
        }

        for &block in chain_block_mergeset_blues {
            if self.reachability.is_dag_ancestor_of(staging, block, blue_candidate)? {
                continue;
            }

            let block_blue_anticone_size = self.blue_anticone_size(staging, block, new_block_data)?;
            candidate_blues_anticone_sizes.insert(block, block_blue_anticone_size);

            *candidate_blue_anticone_size += 1;
            if *candidate_blue_anticone_size > self.k {
                // The candidate's blue anticone exceeds K
                return Ok(ColoringState::Red);
            }

            if block_blue_anticone_size >= self.k {
                // A blue in the candidate's anticone already has K blues in its own anticone
                return Ok(ColoringState::Red);
            }
        }

        Ok(ColoringState::Pending)
    }

    /// Blue anticone size of `block` from the point of view of `context`.
    /// `block` must be in the blue set of `context`.
    fn blue_anticone_size(&self, staging: &StagingArea, block: Hash, context: &GhostdagData) -> GhostdagResult<KType> {
        if let Some(size) = context.blues_anticone_sizes.get(&block) {
            return Ok(*size);
        }
        let mut current = context.selected_parent;
        loop {
            if current == self.genesis_hash || current.is_zero() {
                return Err(GhostdagError::NotInBlueSet(block));
            }
            let data = self.data(staging, current)?;
            if let Some(size) = data.blues_anticone_sizes.get(&block) {
                return Ok(*size);
            }
            current = data.selected_parent;
        }
    }
}
