//! RV32I pipelined processor simulator library.
//!
//! This crate implements a cycle-accurate RV32I simulator with the following:
//! 1. **Core:** Five-stage in-order pipeline (fetch, decode, execute, memory, writeback)
//!    with operand forwarding, load-use stalls and fetch annulment on redirects.
//! 2. **Memory:** Direct-mapped or two-way write-back caches driven by an explicit
//!    Ready/Lookup/Writeback/Fill state machine, in front of a latency-modelled main memory.
//! 3. **ISA:** Decoding and disassembly of the RV32I base integer instruction set.
//! 4. **SoC:** Address decoding and the MMIO console, exit and argument registers.
//! 5. **Simulation:** Image loading, configuration and statistics collection.

/// Common types and constants (errors, memory map constants).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU core (pipeline, register file, execution units, caches).
pub mod core;
/// Instruction set (decode, instruction bits, RV32I encodings, disassembly).
pub mod isa;
/// Simulation driver and image loader.
pub mod sim;
/// Main memory, address map and MMIO devices.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Simulator context holding registers, pipeline latches and the memory system.
pub use crate::core::Cpu;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::simulator::{RunOutcome, Simulator};
