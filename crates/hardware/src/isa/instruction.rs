//! RV32I field extraction.
//!
//! Every base instruction is 32 bits wide and keeps `opcode`, `rd`, `rs1`, `rs2`,
//! `funct3` and `funct7` at fixed positions, so the accessors below apply to all
//! formats. Immediates depend on the format and are assembled in `isa::decode`.

/// Bit mask for extracting the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;
/// Bit mask for extracting a register index field (5 bits).
pub const REG_MASK: u32 = 0x1F;
/// Bit mask for extracting the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;
/// Bit mask for extracting the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;

/// Fixed-position field accessors on a raw instruction word.
pub trait InstructionBits {
    /// Extracts the opcode field (bits 0-6).
    fn opcode(&self) -> u32;

    /// Extracts the destination register field (bits 7-11).
    fn rd(&self) -> usize;

    /// Extracts the first source register field (bits 15-19).
    fn rs1(&self) -> usize;

    /// Extracts the second source register field (bits 20-24).
    fn rs2(&self) -> usize;

    /// Extracts the funct3 field (bits 12-14): operation, branch condition or access width.
    fn funct3(&self) -> u32;

    /// Extracts the funct7 field (bits 25-31). Only `0x20` (SUB, SRA, SRAI) is meaningful in RV32I.
    fn funct7(&self) -> u32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & OPCODE_MASK
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & REG_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & REG_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }
}

/// Raw fields of one instruction word plus its format-specific immediate.
///
/// All register and function fields are filled in regardless of format; `opcode`
/// says which of them carry meaning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Raw 32-bit instruction encoding.
    pub raw: u32,
    /// Extracted opcode field.
    pub opcode: u32,
    /// Destination register index.
    pub rd: usize,
    /// First source register index.
    pub rs1: usize,
    /// Second source register index.
    pub rs2: usize,
    /// `funct3` field.
    pub funct3: u32,
    /// `funct7` field.
    pub funct7: u32,
    /// Sign-extended immediate value (0 for R-type and unknown opcodes).
    pub imm: i32,
}
