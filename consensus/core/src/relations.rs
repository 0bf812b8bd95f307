use serde::{Deserialize, Serialize};

use crate::Hash;

/// Parents and known children of a block at one DAG level
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRelations {
    pub parents: Vec<Hash>,
    pub children: Vec<Hash>,
}

impl BlockRelations {
    pub fn new(parents: Vec<Hash>, children: Vec<Hash>) -> Self {
        Self { parents, children }
    }

    pub fn with_parents(parents: Vec<Hash>) -> Self {
        Self { parents, children: Vec::new() }
    }

    /// Records `child`; returns false if it was already known
    pub fn add_child(&mut self, child: Hash) -> bool {
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }
}
