//! RV32I Instruction Decoder.
//!
//! This module handles the decoding of 32-bit RISC-V instruction encodings into
//! a structured `Decoded` format. It extracts opcodes, register indices, function
//! codes, and handles the sign-extension of immediate values for all instruction
//! formats (R, I, S, B, U, J).

use crate::isa::instruction::{Decoded, InstructionBits};
use crate::isa::rv32i::opcodes;

/// Total width of a RISC-V instruction in bits.
const INSTRUCTION_WIDTH: u32 = 32;

/// Bit shift for extracting the I-Type immediate (bits 20-31).
const I_IMM_SHIFT: u32 = 20;

/// Bit mask for the U-Type immediate (bits 12-31, not shifted).
const U_IMM_MASK: u32 = 0xFFFF_F000;

/// Decodes a RISC-V instruction into its component fields.
///
/// # Arguments
///
/// * `inst` - The 32-bit instruction encoding to decode
///
/// # Returns
///
/// A `Decoded` structure containing all extracted instruction fields. The immediate
/// is 0 for R-type and unknown opcodes.
pub fn decode(inst: u32) -> Decoded {
    let opcode = inst.opcode();

    let imm = match opcode {
        opcodes::OP_IMM | opcodes::OP_LOAD | opcodes::OP_JALR | opcodes::OP_MISC_MEM => {
            i_type_imm(inst)
        }
        opcodes::OP_STORE => s_type_imm(inst),
        opcodes::OP_BRANCH => b_type_imm(inst),
        opcodes::OP_LUI | opcodes::OP_AUIPC => u_type_imm(inst),
        opcodes::OP_JAL => j_type_imm(inst),
        _ => 0,
    };

    Decoded {
        raw: inst,
        opcode,
        rd: inst.rd(),
        rs1: inst.rs1(),
        rs2: inst.rs2(),
        funct3: inst.funct3(),
        funct7: inst.funct7(),
        imm,
    }
}

/// I-Type: `imm[11:0] | rs1 | funct3 | rd | opcode`.
const fn i_type_imm(inst: u32) -> i32 {
    (inst as i32) >> I_IMM_SHIFT
}

/// S-Type: `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`.
const fn s_type_imm(inst: u32) -> i32 {
    let low = (inst >> 7) & 0x1F;
    let high = (inst >> 25) & 0x7F;
    sign_extend((high << 5) | low, 12)
}

/// B-Type: `imm[12] | imm[10:5] | rs2 | rs1 | funct3 | imm[4:1] | imm[11] | opcode`.
///
/// The offset is always even.
const fn b_type_imm(inst: u32) -> i32 {
    let bit_11 = (inst >> 7) & 0x1;
    let bits_4_1 = (inst >> 8) & 0xF;
    let bits_10_5 = (inst >> 25) & 0x3F;
    let bit_12 = (inst >> 31) & 0x1;
    sign_extend(
        (bit_12 << 12) | (bit_11 << 11) | (bits_10_5 << 5) | (bits_4_1 << 1),
        13,
    )
}

/// U-Type: `imm[31:12] | rd | opcode`, already shifted into place.
const fn u_type_imm(inst: u32) -> i32 {
    (inst & U_IMM_MASK) as i32
}

/// J-Type: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`.
const fn j_type_imm(inst: u32) -> i32 {
    let bits_19_12 = (inst >> 12) & 0xFF;
    let bit_11 = (inst >> 20) & 0x1;
    let bits_10_1 = (inst >> 21) & 0x3FF;
    let bit_20 = (inst >> 31) & 0x1;
    sign_extend(
        (bit_20 << 20) | (bits_19_12 << 12) | (bit_11 << 11) | (bits_10_1 << 1),
        21,
    )
}

/// Sign extends the low `bits` of `val` to a 32-bit signed integer.
const fn sign_extend(val: u32, bits: u32) -> i32 {
    let shift = INSTRUCTION_WIDTH - bits;
    ((val << shift) as i32) >> shift
}
