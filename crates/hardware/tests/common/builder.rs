//! Fluent RV32I instruction encoder.
//!
//! `InstructionBuilder` packs fields by format; the free functions below cover
//! the instructions tests actually write programs with.

use rv32sim_core::common::constants::{MMIO_ARG, MMIO_CONSOLE_BYTE, MMIO_CONSOLE_INT, MMIO_EXIT};
use rv32sim_core::isa::rv32i::{funct3, funct7, opcodes::*};

#[derive(Clone, Copy, Debug, Default)]
pub struct InstructionBuilder {
    opcode: u32,
    rd: u32,
    funct3: u32,
    rs1: u32,
    rs2: u32,
    funct7: u32,
    imm: i32,
}

impl InstructionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opcode(mut self, op: u32) -> Self {
        self.opcode = op;
        self
    }

    pub fn rd(mut self, rd: u32) -> Self {
        self.rd = rd;
        self
    }

    pub fn rs1(mut self, rs1: u32) -> Self {
        self.rs1 = rs1;
        self
    }

    pub fn rs2(mut self, rs2: u32) -> Self {
        self.rs2 = rs2;
        self
    }

    pub fn funct3(mut self, funct3: u32) -> Self {
        self.funct3 = funct3;
        self
    }

    pub fn funct7(mut self, funct7: u32) -> Self {
        self.funct7 = funct7;
        self
    }

    pub fn imm(mut self, imm: i32) -> Self {
        self.imm = imm;
        self
    }

    /// Encodes the instruction in the format implied by its opcode.
    pub fn build(self) -> u32 {
        let imm = self.imm as u32;
        let rd = (self.rd & 0x1f) << 7;
        let rs1 = (self.rs1 & 0x1f) << 15;
        let rs2 = (self.rs2 & 0x1f) << 20;
        let f3 = (self.funct3 & 0x7) << 12;
        match self.opcode {
            OP_REG => (self.funct7 << 25) | rs2 | rs1 | f3 | rd | self.opcode,
            OP_IMM | OP_LOAD | OP_JALR | OP_MISC_MEM | OP_SYSTEM => {
                ((imm & 0xfff) << 20) | rs1 | f3 | rd | self.opcode
            }
            OP_STORE => {
                (((imm >> 5) & 0x7f) << 25) | rs2 | rs1 | f3 | ((imm & 0x1f) << 7) | self.opcode
            }
            OP_BRANCH => {
                (((imm >> 12) & 1) << 31)
                    | (((imm >> 5) & 0x3f) << 25)
                    | rs2
                    | rs1
                    | f3
                    | (((imm >> 1) & 0xf) << 8)
                    | (((imm >> 11) & 1) << 7)
                    | self.opcode
            }
            OP_LUI | OP_AUIPC => (imm & 0xffff_f000) | rd | self.opcode,
            OP_JAL => {
                (((imm >> 20) & 1) << 31)
                    | (((imm >> 1) & 0x3ff) << 21)
                    | (((imm >> 11) & 1) << 20)
                    | (((imm >> 12) & 0xff) << 12)
                    | rd
                    | self.opcode
            }
            _ => self.opcode,
        }
    }

    // --- Helpers for Common Instructions ---

    pub fn op(self, f3: u32, f7: u32, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.opcode(OP_REG)
            .funct3(f3)
            .funct7(f7)
            .rd(rd)
            .rs1(rs1)
            .rs2(rs2)
    }

    pub fn op_imm(self, f3: u32, rd: u32, rs1: u32, imm: i32) -> Self {
        self.opcode(OP_IMM).funct3(f3).rd(rd).rs1(rs1).imm(imm)
    }

    pub fn load(self, f3: u32, rd: u32, rs1: u32, imm: i32) -> Self {
        self.opcode(OP_LOAD).funct3(f3).rd(rd).rs1(rs1).imm(imm)
    }

    pub fn store(self, f3: u32, rs1: u32, rs2: u32, imm: i32) -> Self {
        self.opcode(OP_STORE).funct3(f3).rs1(rs1).rs2(rs2).imm(imm)
    }

    pub fn branch(self, f3: u32, rs1: u32, rs2: u32, imm: i32) -> Self {
        self.opcode(OP_BRANCH).funct3(f3).rs1(rs1).rs2(rs2).imm(imm)
    }
}

pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    InstructionBuilder::new()
        .op(funct3::ADD_SUB, funct7::DEFAULT, rd, rs1, rs2)
        .build()
}

pub fn sub(rd: u32, rs1: u32, rs2: u32) -> u32 {
    InstructionBuilder::new()
        .op(funct3::ADD_SUB, funct7::ALT, rd, rs1, rs2)
        .build()
}

pub fn sra(rd: u32, rs1: u32, rs2: u32) -> u32 {
    InstructionBuilder::new()
        .op(funct3::SRL_SRA, funct7::ALT, rd, rs1, rs2)
        .build()
}

pub fn slt(rd: u32, rs1: u32, rs2: u32) -> u32 {
    InstructionBuilder::new()
        .op(funct3::SLT, funct7::DEFAULT, rd, rs1, rs2)
        .build()
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new()
        .op_imm(funct3::ADD_SUB, rd, rs1, imm)
        .build()
}

pub fn slli(rd: u32, rs1: u32, shamt: u32) -> u32 {
    InstructionBuilder::new()
        .op_imm(funct3::SLL, rd, rs1, shamt as i32)
        .build()
}

pub fn srai(rd: u32, rs1: u32, shamt: u32) -> u32 {
    InstructionBuilder::new()
        .op_imm(funct3::SRL_SRA, rd, rs1, (0b0100000 << 5) | shamt as i32)
        .build()
}

pub fn lui(rd: u32, imm: u32) -> u32 {
    InstructionBuilder::new()
        .opcode(OP_LUI)
        .rd(rd)
        .imm(imm as i32)
        .build()
}

pub fn auipc(rd: u32, imm: u32) -> u32 {
    InstructionBuilder::new()
        .opcode(OP_AUIPC)
        .rd(rd)
        .imm(imm as i32)
        .build()
}

pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new().load(funct3::LW, rd, rs1, imm).build()
}

pub fn lh(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new().load(funct3::LH, rd, rs1, imm).build()
}

pub fn lhu(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new().load(funct3::LHU, rd, rs1, imm).build()
}

pub fn lb(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new().load(funct3::LB, rd, rs1, imm).build()
}

pub fn lbu(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new().load(funct3::LBU, rd, rs1, imm).build()
}

pub fn sw(rs1: u32, rs2: u32, imm: i32) -> u32 {
    InstructionBuilder::new().store(funct3::SW, rs1, rs2, imm).build()
}

pub fn sh(rs1: u32, rs2: u32, imm: i32) -> u32 {
    InstructionBuilder::new().store(funct3::SH, rs1, rs2, imm).build()
}

pub fn sb(rs1: u32, rs2: u32, imm: i32) -> u32 {
    InstructionBuilder::new().store(funct3::SB, rs1, rs2, imm).build()
}

pub fn beq(rs1: u32, rs2: u32, imm: i32) -> u32 {
    InstructionBuilder::new().branch(funct3::BEQ, rs1, rs2, imm).build()
}

pub fn bne(rs1: u32, rs2: u32, imm: i32) -> u32 {
    InstructionBuilder::new().branch(funct3::BNE, rs1, rs2, imm).build()
}

pub fn blt(rs1: u32, rs2: u32, imm: i32) -> u32 {
    InstructionBuilder::new().branch(funct3::BLT, rs1, rs2, imm).build()
}

pub fn jal(rd: u32, imm: i32) -> u32 {
    InstructionBuilder::new().opcode(OP_JAL).rd(rd).imm(imm).build()
}

pub fn jalr(rd: u32, rs1: u32, imm: i32) -> u32 {
    InstructionBuilder::new()
        .opcode(OP_JALR)
        .funct3(funct3::JALR)
        .rd(rd)
        .rs1(rs1)
        .imm(imm)
        .build()
}

pub fn fence() -> u32 {
    InstructionBuilder::new()
        .opcode(OP_MISC_MEM)
        .funct3(funct3::FENCE)
        .imm(0x0ff)
        .build()
}

pub fn ecall() -> u32 {
    InstructionBuilder::new().opcode(OP_SYSTEM).build()
}

/// `rd = value` as `lui` + `addi`.
pub fn li(rd: u32, value: u32) -> Vec<u32> {
    let hi = value.wrapping_add(0x800) & 0xffff_f000;
    let lo = value.wrapping_sub(hi) as i32;
    let mut out = Vec::new();
    if hi != 0 {
        out.push(lui(rd, hi));
        if lo != 0 {
            out.push(addi(rd, rd, lo));
        }
    } else {
        out.push(addi(rd, 0, lo));
    }
    out
}

/// Scratch register used by the MMIO helpers (t6).
pub const SCRATCH: u32 = 31;

/// Writes the low byte of `rs` to the console.
pub fn print_char(rs: u32) -> Vec<u32> {
    vec![lui(SCRATCH, MMIO_CONSOLE_BYTE), sw(SCRATCH, rs, 0)]
}

/// Writes `rs` to the console as a signed decimal.
pub fn print_int(rs: u32) -> Vec<u32> {
    vec![lui(SCRATCH, MMIO_CONSOLE_INT & !0xfff), sw(SCRATCH, rs, 4)]
}

/// Reads the next argument word into `rd`.
pub fn read_arg(rd: u32) -> Vec<u32> {
    vec![lui(SCRATCH, MMIO_ARG), lw(rd, SCRATCH, 0)]
}

/// Exits with the value of `rs`.
pub fn exit(rs: u32) -> Vec<u32> {
    vec![lui(SCRATCH, MMIO_EXIT), sw(SCRATCH, rs, 0)]
}
