//! Instruction Disassembler for RV32I.
//!
//! Converts a 32-bit instruction encoding into a human-readable mnemonic
//! string for debug tracing, logging, and test diagnostics. Registers are
//! printed with their ABI names.
//!
//! # Usage
//!
//! ```
//! use rv32sim_core::isa::disasm::disassemble;
//! let text = disassemble(0x00A0_0513); // ADDI x10, x0, 10
//! assert_eq!(text, "addi a0, zero, 10");
//! ```

use crate::isa::decode::decode;
use crate::isa::rv32i::{funct3 as f3, funct7 as f7, opcodes as op};

/// ABI register names for x0–x31.
const REG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Returns the ABI name for an integer register index.
#[inline]
fn xreg(idx: usize) -> &'static str {
    REG_NAMES.get(idx).copied().unwrap_or("x??")
}

/// Disassembles a 32-bit RV32I instruction into a human-readable string.
///
/// Returns a mnemonic like `"add a0, a1, a2"` or `"unknown (0x...)"` for
/// encodings the core does not implement.
///
/// # Arguments
///
/// * `inst` - The raw 32-bit instruction encoding.
pub fn disassemble(inst: u32) -> String {
    let d = decode(inst);
    let (rd, rs1, rs2, imm) = (xreg(d.rd), xreg(d.rs1), xreg(d.rs2), d.imm);

    let text = match d.opcode {
        op::OP_REG => reg_mnemonic(d.funct3, d.funct7).map(|mn| format!("{mn} {rd}, {rs1}, {rs2}")),
        op::OP_IMM => imm_mnemonic(d.funct3, d.funct7).map(|mn| match d.funct3 {
            f3::SLL | f3::SRL_SRA => format!("{mn} {rd}, {rs1}, {}", d.rs2),
            _ => format!("{mn} {rd}, {rs1}, {imm}"),
        }),
        op::OP_LOAD => {
            let mn = match d.funct3 {
                f3::LB => Some("lb"),
                f3::LH => Some("lh"),
                f3::LW => Some("lw"),
                f3::LBU => Some("lbu"),
                f3::LHU => Some("lhu"),
                _ => None,
            };
            mn.map(|mn| format!("{mn} {rd}, {imm}({rs1})"))
        }
        op::OP_STORE => {
            let mn = match d.funct3 {
                f3::SB => Some("sb"),
                f3::SH => Some("sh"),
                f3::SW => Some("sw"),
                _ => None,
            };
            mn.map(|mn| format!("{mn} {rs2}, {imm}({rs1})"))
        }
        op::OP_BRANCH => {
            let mn = match d.funct3 {
                f3::BEQ => Some("beq"),
                f3::BNE => Some("bne"),
                f3::BLT => Some("blt"),
                f3::BGE => Some("bge"),
                f3::BLTU => Some("bltu"),
                f3::BGEU => Some("bgeu"),
                _ => None,
            };
            mn.map(|mn| format!("{mn} {rs1}, {rs2}, {imm}"))
        }
        op::OP_LUI => Some(format!("lui {rd}, {:#x}", (imm as u32) >> 12)),
        op::OP_AUIPC => Some(format!("auipc {rd}, {:#x}", (imm as u32) >> 12)),
        op::OP_JAL => Some(format!("jal {rd}, {imm}")),
        op::OP_JALR if d.funct3 == f3::JALR => Some(format!("jalr {rd}, {imm}({rs1})")),
        op::OP_MISC_MEM if d.funct3 == f3::FENCE => Some("fence".to_string()),
        op::OP_SYSTEM => Some(match inst {
            0x0000_0073 => "ecall".to_string(),
            0x0010_0073 => "ebreak".to_string(),
            _ => format!("system ({inst:#010x})"),
        }),
        _ => None,
    };

    text.unwrap_or_else(|| format!("unknown ({inst:#010x})"))
}

fn reg_mnemonic(funct3: u32, funct7: u32) -> Option<&'static str> {
    let mn = match (funct3, funct7) {
        (f3::ADD_SUB, f7::DEFAULT) => "add",
        (f3::ADD_SUB, f7::ALT) => "sub",
        (f3::SLL, f7::DEFAULT) => "sll",
        (f3::SLT, f7::DEFAULT) => "slt",
        (f3::SLTU, f7::DEFAULT) => "sltu",
        (f3::XOR, f7::DEFAULT) => "xor",
        (f3::SRL_SRA, f7::DEFAULT) => "srl",
        (f3::SRL_SRA, f7::ALT) => "sra",
        (f3::OR, f7::DEFAULT) => "or",
        (f3::AND, f7::DEFAULT) => "and",
        _ => return None,
    };
    Some(mn)
}

fn imm_mnemonic(funct3: u32, funct7: u32) -> Option<&'static str> {
    let mn = match funct3 {
        f3::ADD_SUB => "addi",
        f3::SLT => "slti",
        f3::SLTU => "sltiu",
        f3::XOR => "xori",
        f3::OR => "ori",
        f3::AND => "andi",
        f3::SLL if funct7 == f7::DEFAULT => "slli",
        f3::SRL_SRA if funct7 == f7::DEFAULT => "srli",
        f3::SRL_SRA if funct7 == f7::ALT => "srai",
        _ => return None,
    };
    Some(mn)
}
