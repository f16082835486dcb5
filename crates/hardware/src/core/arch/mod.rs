//! RISC-V architectural state.
//!
//! RV32I has no architectural state beyond the program counter and the
//! integer register file, which lives in [`gpr`].

/// General-Purpose Register file implementation.
pub mod gpr;
