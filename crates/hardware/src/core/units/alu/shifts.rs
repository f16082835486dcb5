//! ALU shift operations.
//!
//! Shift amounts are masked to 5 bits (0–31); the upper bits of `b` are ignored.

use crate::core::pipeline::signals::AluOp;

/// Bit mask for the RV32 shift amount.
const SHAMT_MASK: u32 = 0x1F;

/// Executes a shift operation.
///
/// Returns `0` for non-shift opcodes.
pub const fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    let shamt = b & SHAMT_MASK;
    match op {
        AluOp::Sll => a << shamt,
        AluOp::Srl => a >> shamt,
        AluOp::Sra => ((a as i32) >> shamt) as u32,
        _ => 0,
    }
}
