//! Common utilities and types used throughout the simulator.
//!
//! 1. **Constants:** Instruction sizes, register counts and the fixed MMIO address map.
//! 2. **Error Handling:** Component-level memory errors and run-level simulation errors.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types for memory components, configuration, loading and simulation.
pub mod error;

pub use error::{ConfigError, LoadError, MemError, SimError};
