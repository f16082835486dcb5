//! ALU bitwise and comparison operations.
//!
//! `Slt`/`Sltu` produce 1 or 0.

use crate::core::pipeline::signals::AluOp;

/// Executes a logical or set-less-than operation.
///
/// Returns `0` for opcodes outside this group.
pub const fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    match op {
        AluOp::Or => a | b,
        AluOp::And => a & b,
        AluOp::Xor => a ^ b,
        AluOp::Slt => ((a as i32) < (b as i32)) as u32,
        AluOp::Sltu => (a < b) as u32,
        _ => 0,
    }
}
