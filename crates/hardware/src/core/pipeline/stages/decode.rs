//! Instruction Decode (ID) Stage.
//!
//! This module implements the second stage of the pipeline. It performs the following:
//! 1. **Decoding:** Converts raw 32-bit instruction bits into a `DecodedInst` bundle.
//! 2. **Operand Resolution:** Reads rs1/rs2 through the forwarding network.
//! 3. **Hazard Stalls:** Holds the instruction in IF/ID while a load result is outstanding.
//! 4. **Redirect Handling:** Drops the wrong-path instruction when Execute redirects.

use tracing::{trace, warn};

use crate::common::error::SimError;
use crate::core::Cpu;
use crate::core::pipeline::hazards::{Operand, resolve_operand};
use crate::core::pipeline::latches::{DecodedInst, IdExEntry};
use crate::core::pipeline::signals::{AluOp, BranchOp, InstType, MemOp, MemWidth};
use crate::isa::decode::decode as instruction_decode;
use crate::isa::disasm::disassemble;
use crate::isa::rv32i::{funct3, funct7, opcodes};

/// Decodes an instruction word into its control bundle.
///
/// Unknown opcodes and funct3/funct7 combinations, the SYSTEM opcode and the
/// all-zero word yield `InstType::Unsupported` with no sources, destination or
/// memory function.
///
/// # Arguments
///
/// * `inst` - Raw instruction encoding.
/// * `pc` - Address the instruction was fetched from.
pub fn decode_control(inst: u32, pc: u32) -> DecodedInst {
    let d = instruction_decode(inst);
    let unsupported = DecodedInst::nop(InstType::Unsupported, pc, inst);

    let base = DecodedInst {
        inst_type: InstType::Unsupported,
        alu_op: AluOp::Add,
        branch_op: None,
        mem_op: None,
        rs1: None,
        rs2: None,
        rd: None,
        imm: d.imm,
        pc,
        inst,
    };

    match d.opcode {
        opcodes::OP_LUI => DecodedInst {
            inst_type: InstType::Lui,
            alu_op: AluOp::PassB,
            rd: Some(d.rd),
            ..base
        },
        opcodes::OP_AUIPC => DecodedInst {
            inst_type: InstType::Auipc,
            rd: Some(d.rd),
            ..base
        },
        opcodes::OP_JAL => DecodedInst {
            inst_type: InstType::Jal,
            rd: Some(d.rd),
            ..base
        },
        opcodes::OP_JALR if d.funct3 == funct3::JALR => DecodedInst {
            inst_type: InstType::Jalr,
            rs1: Some(d.rs1),
            rd: Some(d.rd),
            ..base
        },
        opcodes::OP_BRANCH => {
            let op = match d.funct3 {
                funct3::BEQ => BranchOp::Eq,
                funct3::BNE => BranchOp::Ne,
                funct3::BLT => BranchOp::Lt,
                funct3::BGE => BranchOp::Ge,
                funct3::BLTU => BranchOp::Ltu,
                funct3::BGEU => BranchOp::Geu,
                _ => return unsupported,
            };
            DecodedInst {
                inst_type: InstType::Branch,
                branch_op: Some(op),
                rs1: Some(d.rs1),
                rs2: Some(d.rs2),
                ..base
            }
        }
        opcodes::OP_LOAD => {
            let op = match d.funct3 {
                funct3::LB => MemOp::load(MemWidth::Byte, true),
                funct3::LH => MemOp::load(MemWidth::Half, true),
                funct3::LW => MemOp::load(MemWidth::Word, true),
                funct3::LBU => MemOp::load(MemWidth::Byte, false),
                funct3::LHU => MemOp::load(MemWidth::Half, false),
                _ => return unsupported,
            };
            DecodedInst {
                inst_type: InstType::Load,
                mem_op: Some(op),
                rs1: Some(d.rs1),
                rd: Some(d.rd),
                ..base
            }
        }
        opcodes::OP_STORE => {
            let op = match d.funct3 {
                funct3::SB => MemOp::store(MemWidth::Byte),
                funct3::SH => MemOp::store(MemWidth::Half),
                funct3::SW => MemOp::store(MemWidth::Word),
                _ => return unsupported,
            };
            DecodedInst {
                inst_type: InstType::Store,
                mem_op: Some(op),
                rs1: Some(d.rs1),
                rs2: Some(d.rs2),
                ..base
            }
        }
        opcodes::OP_IMM => {
            let alu_op = match (d.funct3, d.funct7) {
                (funct3::ADD_SUB, _) => AluOp::Add,
                (funct3::SLT, _) => AluOp::Slt,
                (funct3::SLTU, _) => AluOp::Sltu,
                (funct3::XOR, _) => AluOp::Xor,
                (funct3::OR, _) => AluOp::Or,
                (funct3::AND, _) => AluOp::And,
                (funct3::SLL, funct7::DEFAULT) => AluOp::Sll,
                (funct3::SRL_SRA, funct7::DEFAULT) => AluOp::Srl,
                (funct3::SRL_SRA, funct7::ALT) => AluOp::Sra,
                _ => return unsupported,
            };
            // Shift immediates carry only the 5-bit shamt.
            let imm = match alu_op {
                AluOp::Sll | AluOp::Srl | AluOp::Sra => d.rs2 as i32,
                _ => d.imm,
            };
            DecodedInst {
                inst_type: InstType::OpImm,
                alu_op,
                rs1: Some(d.rs1),
                rd: Some(d.rd),
                imm,
                ..base
            }
        }
        opcodes::OP_REG => {
            let alu_op = match (d.funct3, d.funct7) {
                (funct3::ADD_SUB, funct7::DEFAULT) => AluOp::Add,
                (funct3::ADD_SUB, funct7::ALT) => AluOp::Sub,
                (funct3::SLL, funct7::DEFAULT) => AluOp::Sll,
                (funct3::SLT, funct7::DEFAULT) => AluOp::Slt,
                (funct3::SLTU, funct7::DEFAULT) => AluOp::Sltu,
                (funct3::XOR, funct7::DEFAULT) => AluOp::Xor,
                (funct3::SRL_SRA, funct7::DEFAULT) => AluOp::Srl,
                (funct3::SRL_SRA, funct7::ALT) => AluOp::Sra,
                (funct3::OR, funct7::DEFAULT) => AluOp::Or,
                (funct3::AND, funct7::DEFAULT) => AluOp::And,
                _ => return unsupported,
            };
            DecodedInst {
                inst_type: InstType::Op,
                alu_op,
                rs1: Some(d.rs1),
                rs2: Some(d.rs2),
                rd: Some(d.rd),
                imm: 0,
                ..base
            }
        }
        opcodes::OP_MISC_MEM if d.funct3 == funct3::FENCE => {
            DecodedInst::nop(InstType::Fence, pc, inst)
        }
        _ => unsupported,
    }
}

/// Executes the instruction decode stage.
///
/// Consumes IF/ID when ID/EX is free and both operands are available. A pending
/// redirect from Execute annuls IF/ID instead.
///
/// # Errors
///
/// Raises the fault carried by an IF/ID entry whose fetch was invalid.
pub fn decode_stage(cpu: &mut Cpu) -> Result<(), SimError> {
    if cpu.redirect.is_some() {
        if let Some(entry) = cpu.if_id.take() {
            trace!("decode {:#010x}: annulled wrong-path instruction", entry.pc);
        }
        return Ok(());
    }

    let Some(entry) = cpu.if_id else {
        return Ok(());
    };
    if cpu.id_ex.is_some() {
        return Ok(());
    }
    if let Some(fault) = entry.fault {
        return Err(fault.into_error(entry.pc, cpu.stats.cycles));
    }

    let decoded = decode_control(entry.inst, entry.pc);
    if decoded.inst_type == InstType::Unsupported {
        warn!(
            "unsupported instruction {:#010x} at {:#010x} executed as no-op",
            entry.inst, entry.pc
        );
    }

    let op1 = resolve_operand(cpu, decoded.rs1);
    let op2 = resolve_operand(cpu, decoded.rs2);
    let (Some(rv1), Some(rv2)) = (op1.value(), op2.value()) else {
        cpu.stats.stalls_data += 1;
        return Ok(());
    };
    cpu.stats.forwards += [op1, op2]
        .iter()
        .filter(|op| matches!(op, Operand::Forwarded(_)))
        .count() as u64;

    trace!("decode {:#010x}: {}", entry.pc, disassemble(entry.inst));
    cpu.if_id = None;
    cpu.id_ex = Some(IdExEntry { decoded, rv1, rv2 });
    Ok(())
}
