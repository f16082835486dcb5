//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Evicts the oldest line in a set regardless of how recently it was used.
//! A round-robin pointer per set advances on every fill; hits leave it alone.
//!
//! # Performance
//!
//! - `update()` and `get_victim()`: O(1)
//! - **Worst Case:** Workloads with strong temporal locality

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Debug, Clone)]
pub struct FifoPolicy {
    /// Next way to be evicted for each set.
    next_way: Vec<usize>,
    /// Number of ways in the cache.
    ways: usize,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            next_way: vec![0; sets],
            ways: ways.max(1),
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn update(&mut self, _set: usize, _way: usize) {}

    fn fill(&mut self, set: usize, way: usize) {
        if let Some(next) = self.next_way.get_mut(set)
            && *next == way
        {
            *next = (*next + 1) % self.ways;
        }
    }

    fn get_victim(&self, set: usize) -> usize {
        self.next_way.get(set).copied().unwrap_or(0)
    }
}
