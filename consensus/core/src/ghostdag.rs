use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{BlockHashMap, BlueWorkType, Hash, KType, ZERO_HASH};

/// GHOSTDAG data of a block: its selected parent, scores and the blue/red partition of its merge set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostdagData {
    /// Accumulated count of blue blocks in the past of the block (exclusive)
    pub blue_score: u64,
    /// Accumulated proof of work of blue blocks in the past of the block (exclusive)
    pub blue_work: BlueWorkType,
    /// Parent with the highest blue work
    pub selected_parent: Hash,
    /// Blue merge set blocks, starting with the selected parent
    pub mergeset_blues: Vec<Hash>,
    /// Red merge set blocks
    pub mergeset_reds: Vec<Hash>,
    /// For every blue block in the merge set, the number of blues in its anticone from the point of view of this block
    pub blues_anticone_sizes: BlockHashMap<KType>,
}

impl GhostdagData {
    pub fn new(
        blue_score: u64,
        blue_work: BlueWorkType,
        selected_parent: Hash,
        mergeset_blues: Vec<Hash>,
        mergeset_reds: Vec<Hash>,
        blues_anticone_sizes: BlockHashMap<KType>,
    ) -> Self {
        Self { blue_score, blue_work, selected_parent, mergeset_blues, mergeset_reds, blues_anticone_sizes }
    }

    /// Data of a block which is about to be colored: only its selected parent is known, and it is blue
    pub fn new_with_selected_parent(selected_parent: Hash, k: KType) -> Self {
        let mut mergeset_blues: Vec<Hash> = Vec::with_capacity(k as usize + 1);
        let mut blues_anticone_sizes: BlockHashMap<KType> = BlockHashMap::with_capacity(k as usize);
        mergeset_blues.push(selected_parent);
        blues_anticone_sizes.insert(selected_parent, 0);

        Self {
            blue_score: Default::default(),
            blue_work: Default::default(),
            selected_parent,
            mergeset_blues,
            mergeset_reds: Default::default(),
            blues_anticone_sizes,
        }
    }

    /// Data of the genesis block: no selected parent, empty merge set, zero scores
    pub fn genesis() -> Self {
        Self::new(0, BlueWorkType::ZERO, ZERO_HASH, Vec::new(), Vec::new(), BlockHashMap::new())
    }

    pub fn mergeset_size(&self) -> usize {
        self.mergeset_blues.len() + self.mergeset_reds.len()
    }

    /// Returns an iterator to the mergeset with no specified order (excluding the selected parent)
    pub fn unordered_mergeset_without_selected_parent(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().skip(1).cloned().chain(self.mergeset_reds.iter().cloned())
    }

    /// Returns an iterator to the mergeset with no specified order (including the selected parent)
    pub fn unordered_mergeset(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().cloned().chain(self.mergeset_reds.iter().cloned())
    }

    pub fn add_blue(&mut self, block: Hash, blue_anticone_size: KType, block_blues_anticone_sizes: &BlockHashMap<KType>) {
        // Add the new blue block to mergeset blues
        self.mergeset_blues.push(block);

        // Get a mut ref to internal anticone size map
        let blues_anticone_sizes = &mut self.blues_anticone_sizes;

        // Insert the new blue block with its blue anticone size to the map
        blues_anticone_sizes.insert(block, blue_anticone_size);

        // Insert/update map entries for blocks affected by this insertion
        for (blue, size) in block_blues_anticone_sizes {
            blues_anticone_sizes.insert(*blue, size + 1);
        }
    }

    pub fn add_red(&mut self, block: Hash) {
        // Add the new red block to mergeset reds
        self.mergeset_reds.push(block);
    }

    pub fn finalize_score_and_work(&mut self, blue_score: u64, blue_work: BlueWorkType) {
        self.blue_score = blue_score;
        self.blue_work = blue_work;
    }
}

/// Compact view of the scores only, used where the merge set is not needed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CompactGhostdagData {
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub selected_parent: Hash,
}

impl From<&GhostdagData> for CompactGhostdagData {
    fn from(value: &GhostdagData) -> Self {
        Self { blue_score: value.blue_score, blue_work: value.blue_work, selected_parent: value.selected_parent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_blue_bumps_affected_anticone_sizes() {
        let sp = Hash::from_u64_word(1);
        let other = Hash::from_u64_word(2);
        let mut data = GhostdagData::new_with_selected_parent(sp, 18);
        assert_eq!(data.mergeset_blues, vec![sp]);

        let mut affected = BlockHashMap::new();
        affected.insert(sp, 0);
        data.add_blue(other, 1, &affected);
        assert_eq!(data.blues_anticone_sizes[&other], 1);
        assert_eq!(data.blues_anticone_sizes[&sp], 1);

        data.add_red(Hash::from_u64_word(3));
        assert_eq!(data.mergeset_size(), 3);
        assert_eq!(data.unordered_mergeset_without_selected_parent().collect::<Vec<_>>(), vec![other, Hash::from_u64_word(3)]);
    }

    #[test]
    fn genesis_data() {
        let g = GhostdagData::genesis();
        assert_eq!(g.blue_score, 0);
        assert!(g.blue_work.is_zero());
        assert_eq!(g.selected_parent, ZERO_HASH);
        assert_eq!(g.mergeset_size(), 0);
        assert_eq!(CompactGhostdagData::from(&g).blue_score, 0);
    }
}
