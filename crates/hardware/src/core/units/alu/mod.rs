//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used in the Execute stage.
//! All operations work on 32-bit words and wrap on overflow.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub
//! - [`logic`]:      Or, And, Xor, Slt, Sltu
//! - [`shifts`]:     Sll, Srl, Sra

/// Integer arithmetic operations (add, subtract).
pub mod arithmetic;

/// Bitwise logical and comparison operations (or, and, xor, slt).
pub mod logic;

/// Shift operations (sll, srl, sra).
pub mod shifts;

use crate::core::pipeline::signals::AluOp;

/// Arithmetic Logic Unit (ALU) for integer operations.
#[derive(Debug, Clone, Copy)]
pub struct Alu;

impl Alu {
    /// Executes an integer ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The ALU operation to perform
    /// * `a`  - First operand (rs1 or PC)
    /// * `b`  - Second operand (rs2 or immediate, also used as shift amount)
    ///
    /// # Examples
    ///
    /// ```
    /// use rv32sim_core::core::units::alu::Alu;
    /// use rv32sim_core::core::pipeline::signals::AluOp;
    ///
    /// assert_eq!(Alu::execute(AluOp::Add, 42, 8), 50);
    /// assert_eq!(Alu::execute(AluOp::Add, 0xFFFF_FFFF, 1), 0);
    /// assert_eq!(Alu::execute(AluOp::Sll, 0x1, 4), 0x10);
    /// assert_eq!(Alu::execute(AluOp::Slt, -5_i32 as u32, 10), 1);
    /// assert_eq!(Alu::execute(AluOp::PassB, 7, 0x1234_5000), 0x1234_5000);
    /// ```
    pub const fn execute(op: AluOp, a: u32, b: u32) -> u32 {
        match op {
            AluOp::Add | AluOp::Sub => arithmetic::execute(op, a, b),
            AluOp::Or | AluOp::And | AluOp::Xor | AluOp::Slt | AluOp::Sltu => {
                logic::execute(op, a, b)
            }
            AluOp::Sll | AluOp::Srl | AluOp::Sra => shifts::execute(op, a, b),
            AluOp::PassB => b,
        }
    }
}
