//! Pipeline control signals and operation types.
//!
//! This module defines the signals that control instruction execution. It performs:
//! 1. **Instruction Classification:** `InstType` selects the datapath through Execute.
//! 2. **Operation Selection:** ALU and branch comparison operations.
//! 3. **Memory Control:** Access kind, width and sign extension for loads and stores.

use serde::Serialize;

/// Instruction classes recognised by the decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum InstType {
    /// Register-immediate arithmetic (ADDI, SLLI, ...).
    OpImm,
    /// Register-register arithmetic (ADD, SUB, ...).
    Op,
    /// Load upper immediate.
    Lui,
    /// Add upper immediate to PC.
    Auipc,
    /// Jump and link.
    Jal,
    /// Jump and link register.
    Jalr,
    /// Conditional branch.
    Branch,
    /// Memory load.
    Load,
    /// Memory store.
    Store,
    /// Memory ordering; a no-op on this in-order core.
    Fence,
    /// Unknown opcode or funct combination; flows through as a no-op.
    #[default]
    Unsupported,
}

impl InstType {
    /// True for instruction classes that flow through as no-ops.
    pub const fn is_nop_class(self) -> bool {
        matches!(self, Self::Fence | Self::Unsupported)
    }
}

/// ALU operation types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AluOp {
    /// Integer addition (also address generation and AUIPC).
    #[default]
    Add,

    /// Integer subtraction.
    Sub,

    /// Shift left logical.
    Sll,

    /// Set less than (signed).
    Slt,

    /// Set less than unsigned.
    Sltu,

    /// Bitwise XOR.
    Xor,

    /// Shift right logical.
    Srl,

    /// Shift right arithmetic.
    Sra,

    /// Bitwise OR.
    Or,

    /// Bitwise AND.
    And,

    /// Pass operand B through (LUI).
    PassB,
}

/// Branch comparison functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than, signed.
    Lt,
    /// Greater or equal, signed.
    Ge,
    /// Less than, unsigned.
    Ltu,
    /// Greater or equal, unsigned.
    Geu,
}

/// Memory access width for load and store operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemWidth {
    /// 8-bit byte access.
    Byte,

    /// 16-bit half-word access.
    Half,

    /// 32-bit word access.
    Word,
}

impl MemWidth {
    /// Access size in bytes (also the required alignment).
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }
}

/// Direction of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemKind {
    /// Read into a register.
    Load,
    /// Write from a register.
    Store,
}

/// Memory function of a load or store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemOp {
    /// Load or store.
    pub kind: MemKind,
    /// Access width.
    pub width: MemWidth,
    /// Sign-extend the loaded value (LB, LH); ignored for stores.
    pub signed: bool,
}

impl MemOp {
    /// A load of `width`, sign-extended when `signed`.
    pub const fn load(width: MemWidth, signed: bool) -> Self {
        Self {
            kind: MemKind::Load,
            width,
            signed,
        }
    }

    /// A store of `width`.
    pub const fn store(width: MemWidth) -> Self {
        Self {
            kind: MemKind::Store,
            width,
            signed: false,
        }
    }

    /// True for loads.
    pub const fn is_load(&self) -> bool {
        matches!(self.kind, MemKind::Load)
    }
}
