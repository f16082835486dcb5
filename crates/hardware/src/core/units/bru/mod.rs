//! Branch Resolution Unit (BRU).
//!
//! Evaluates branch conditions and computes control-flow targets in the Execute
//! stage. Fetch always predicts the sequential path, so every taken branch or
//! jump becomes a redirect.

use crate::core::pipeline::signals::BranchOp;

/// Branch condition evaluation and target computation.
#[derive(Debug, Clone, Copy)]
pub struct Bru;

impl Bru {
    /// Evaluates a branch condition.
    ///
    /// `Lt`/`Ge` compare as signed, `Ltu`/`Geu` as unsigned.
    ///
    /// ```
    /// use rv32sim_core::core::units::bru::Bru;
    /// use rv32sim_core::core::pipeline::signals::BranchOp;
    ///
    /// assert!(Bru::evaluate(BranchOp::Lt, -1_i32 as u32, 0));
    /// assert!(!Bru::evaluate(BranchOp::Ltu, -1_i32 as u32, 0));
    /// ```
    pub const fn evaluate(op: BranchOp, a: u32, b: u32) -> bool {
        match op {
            BranchOp::Eq => a == b,
            BranchOp::Ne => a != b,
            BranchOp::Lt => (a as i32) < (b as i32),
            BranchOp::Ge => (a as i32) >= (b as i32),
            BranchOp::Ltu => a < b,
            BranchOp::Geu => a >= b,
        }
    }

    /// Target of a taken conditional branch or a JAL: `pc + imm`.
    pub const fn relative_target(pc: u32, imm: i32) -> u32 {
        pc.wrapping_add(imm as u32)
    }

    /// Target of a JALR: `(rs1 + imm)` with bit 0 cleared.
    pub const fn jalr_target(rs1: u32, imm: i32) -> u32 {
        rs1.wrapping_add(imm as u32) & !1
    }
}
