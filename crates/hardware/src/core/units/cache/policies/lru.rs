//! Least Recently Used (LRU) Replacement Policy.
//!
//! Keeps a usage stack per set. An access moves the way to the top (MRU
//! position); the bottom of the stack is the victim.
//!
//! # Performance
//!
//! - `update()`: O(W) where W is the number of ways
//! - `get_victim()`: O(1)
//! - **Worst Case:** Scanning patterns larger than the set (thrashing)

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// One usage stack per set. Index 0 is MRU, last index is LRU.
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }
}

impl ReplacementPolicy for LruPolicy {
    fn update(&mut self, set: usize, way: usize) {
        if let Some(stack) = self.usage.get_mut(set) {
            if let Some(pos) = stack.iter().position(|&x| x == way) {
                let _ = stack.remove(pos);
            }
            stack.insert(0, way);
        }
    }

    fn get_victim(&self, set: usize) -> usize {
        self.usage
            .get(set)
            .and_then(|stack| stack.last().copied())
            .unwrap_or(0)
    }
}
