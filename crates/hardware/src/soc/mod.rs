//! System-on-Chip (SoC) Components.
//!
//! This module organizes the components behind the caches: the address map,
//! main memory with its timing controller, and the MMIO devices.

/// MMIO device implementations (console, exit, argument registers).
pub mod devices;

/// Address decoding into DRAM, MMIO registers and unmapped space.
pub mod memory_map;

/// Main memory: backing store, transaction port and latency controllers.
pub mod memory;

pub use memory::MainMemory;
