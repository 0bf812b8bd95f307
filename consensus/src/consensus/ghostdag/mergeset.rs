use std::collections::VecDeque;

use consensus_core::{BlockHashSet, Hash};
use database::prelude::*;

use super::ordering::SortableBlock;
use super::protocol::GhostdagProtocol;
use crate::errors::{GhostdagError, GhostdagResult};

impl GhostdagProtocol {
    /// Blocks in the past of `parents` but outside the past of `selected_parent`,
    /// in ascending (blue work, hash) order
    pub fn ordered_mergeset_without_selected_parent(
        &self,
        staging: &StagingArea,
        selected_parent: Hash,
        parents: &[Hash],
    ) -> GhostdagResult<Vec<Hash>> {
        let mut queue: VecDeque<Hash> = VecDeque::new();
        let mut mergeset = BlockHashSet::new();
        let mut selected_parent_past = BlockHashSet::new();

        for parent in parents.iter().copied().filter(|p| *p != selected_parent) {
            if mergeset.contains(&parent) || selected_parent_past.contains(&parent) {
                continue;
            }
            // A parent already in the past of the selected parent adds nothing
            if self.reachability.is_dag_ancestor_of(staging, parent, selected_parent)? {
                selected_parent_past.insert(parent);
                continue;
            }
            mergeset.insert(parent);
            queue.push_back(parent);
        }

        while let Some(current) = queue.pop_front() {
            let current_parents = self.relations.get_parents(staging, current).optional()?.ok_or(GhostdagError::MissingParentData(current))?;
            for parent in current_parents {
                if mergeset.contains(&parent) || selected_parent_past.contains(&parent) {
                    continue;
                }
                if self.reachability.is_dag_ancestor_of(staging, parent, selected_parent)? {
                    selected_parent_past.insert(parent);
                    continue;
                }
                mergeset.insert(parent);
                queue.push_back(parent);
            }
        }

        self.sort_blocks(staging, mergeset)
    }

    /// Sorts blocks ascending by (blue work, hash)
    pub fn sort_blocks(&self, staging: &StagingArea, blocks: impl IntoIterator<Item = Hash>) -> GhostdagResult<Vec<Hash>> {
        let mut sortable = blocks
            .into_iter()
            .map(|hash| Ok(SortableBlock::new(hash, self.blue_work(staging, hash)?)))
            .collect::<GhostdagResult<Vec<_>>>()?;
        sortable.sort();
        Ok(sortable.into_iter().map(|block| block.hash).collect())
    }
}
