//! Cache Replacement Policies.
//!
//! Selects victim ways in set-associative caches once every way of a set holds
//! a valid line. Both policies are deterministic.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used (default).
//! - `Fifo`: First-In, First-Out.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

use crate::config::ReplacementPolicy as PolicyType;

/// Trait for cache replacement policies.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Records a hit on `way` in `set`.
    fn update(&mut self, set: usize, way: usize);

    /// Records that a new line was installed in `way` of `set`.
    fn fill(&mut self, set: usize, way: usize) {
        self.update(set, way);
    }

    /// Selects the way to evict from a full set.
    fn get_victim(&self, set: usize) -> usize;
}

/// Builds the policy selected by the configuration.
pub fn from_config(policy: PolicyType, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match policy {
        PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyType::Fifo => Box::new(FifoPolicy::new(sets, ways)),
    }
}
