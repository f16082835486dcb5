//! RV32I function codes (funct7, bits 31-25).
//!
//! Used in R-type instructions and immediate shifts to distinguish operations
//! that share the same `funct3` (e.g., ADD vs SUB).

/// Default operation (ADD, SRL, SLLI, etc.).
pub const DEFAULT: u32 = 0b000_0000;

/// Alternate operation: SUB for ADD_SUB, SRA/SRAI for SRL_SRA.
pub const ALT: u32 = 0b010_0000;
