//! Past median time
//!
//! The median timestamp of a block and its selected-chain ancestors, read through
//! a [`StagingArea`] so blocks staged but not yet committed are taken into account.

use consensus_core::Hash;
use database::prelude::*;
use tracing::trace;

#[derive(Clone)]
pub struct PastMedianTimeManager {
    /// Number of blocks sampled, the block itself included
    window_size: usize,
    ghostdag: GhostdagStore,
    headers: HeaderStore,
}

impl PastMedianTimeManager {
    pub fn new(window_size: usize, ghostdag: GhostdagStore, headers: HeaderStore) -> Self {
        Self { window_size, ghostdag, headers }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Median timestamp over `hash` and up to `window_size - 1` of its selected ancestors.
    /// Near genesis the window holds whatever chain exists.
    pub fn past_median_time(&self, staging: &StagingArea, hash: Hash) -> StoreResult<u64> {
        let timestamps = self.window_timestamps(staging, hash)?;
        let median = median(timestamps).ok_or_else(|| StoreError::InvalidParameter(format!("empty past median time window for {}", hash)))?;
        trace!("past median time of {} is {}", hash, median);
        Ok(median)
    }

    fn window_timestamps(&self, staging: &StagingArea, hash: Hash) -> StoreResult<Vec<u64>> {
        let mut timestamps = Vec::with_capacity(self.window_size);
        let mut current = hash;
        while timestamps.len() < self.window_size {
            timestamps.push(self.headers.get_timestamp(staging, current)?);
            current = self.ghostdag.get_selected_parent(staging, current)?;
            // Only genesis has the zero hash as selected parent
            if current.is_zero() {
                break;
            }
        }
        Ok(timestamps)
    }
}

/// Middle value, or the floor of the mean of the two middle values for an even count
fn median(mut timestamps: Vec<u64>) -> Option<u64> {
    if timestamps.is_empty() {
        return None;
    }
    timestamps.sort_unstable();
    let mid = timestamps.len() / 2;
    if timestamps.len() % 2 == 1 {
        Some(timestamps[mid])
    } else {
        let (low, high) = (timestamps[mid - 1], timestamps[mid]);
        Some(low + (high - low) / 2)
    }
}
