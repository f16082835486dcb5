//! RV32I major opcodes (bits 6-0).

/// Load instructions (LB, LH, LW, LBU, LHU).
pub const OP_LOAD: u32 = 0b000_0011;

/// Memory ordering instructions (FENCE).
pub const OP_MISC_MEM: u32 = 0b000_1111;

/// Immediate arithmetic instructions (ADDI, ANDI, SLLI, etc.).
pub const OP_IMM: u32 = 0b001_0011;

/// Add Upper Immediate to PC (AUIPC).
pub const OP_AUIPC: u32 = 0b001_0111;

/// Store instructions (SB, SH, SW).
pub const OP_STORE: u32 = 0b010_0011;

/// Register-Register arithmetic (ADD, SUB, SLL, etc.).
pub const OP_REG: u32 = 0b011_0011;

/// Load Upper Immediate (LUI).
pub const OP_LUI: u32 = 0b011_0111;

/// Conditional Branch instructions (BEQ, BNE, etc.).
pub const OP_BRANCH: u32 = 0b110_0011;

/// Jump and Link Register (JALR).
pub const OP_JALR: u32 = 0b110_0111;

/// Jump and Link (JAL).
pub const OP_JAL: u32 = 0b110_1111;

/// Environment calls and CSR access (ECALL, EBREAK, CSRRW, ...).
///
/// Not implemented by this core; decodes as unsupported.
pub const OP_SYSTEM: u32 = 0b111_0011;
