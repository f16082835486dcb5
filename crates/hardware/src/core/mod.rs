//! Core processor implementation.
//!
//! This module contains the main CPU implementation including the instruction
//! pipeline, execution units, architectural state, and the orchestrator that
//! advances all of them one cycle at a time.

/// Architectural state (integer register file).
pub mod arch;

/// CPU core implementation and execution orchestration.
pub mod cpu;

/// Instruction pipeline implementation (stages, latches, hazards, signals).
pub mod pipeline;

/// Execution units (ALU, branch unit, caches).
pub mod units;

pub use self::cpu::Cpu;
