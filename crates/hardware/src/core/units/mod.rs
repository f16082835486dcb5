//! Execution units and functional components.
//!
//! This module contains the integer ALU, the branch resolution unit and the
//! instruction/data cache model.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Branch Resolution Unit: condition evaluation and target computation.
pub mod bru;

/// Write-back caches with an explicit Ready/Lookup/Writeback/Fill state machine.
pub mod cache;
