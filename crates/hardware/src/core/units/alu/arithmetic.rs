//! ALU arithmetic operations.

use crate::core::pipeline::signals::AluOp;

/// Executes an add or subtract with two's-complement wrap-around.
///
/// Returns `0` for non-arithmetic opcodes.
pub const fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        _ => 0,
    }
}
