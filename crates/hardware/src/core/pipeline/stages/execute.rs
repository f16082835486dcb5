//! Execute (EX) Stage.
//!
//! This module implements the third stage of the instruction pipeline. It performs:
//! 1. **ALU Operations:** Arithmetic and logic on register or immediate operands.
//! 2. **Branch Resolution:** Evaluates conditions and computes jump targets and links.
//! 3. **Address Generation:** Effective addresses for loads and stores.
//! 4. **Redirects:** Signals Fetch whenever the next PC is not `pc + 4`.

use tracing::debug;

use crate::common::constants::INSTRUCTION_SIZE;
use crate::core::Cpu;
use crate::core::pipeline::latches::{ExMemEntry, IdExEntry, MemAccess};
use crate::core::pipeline::signals::InstType;
use crate::core::units::alu::Alu;
use crate::core::units::bru::Bru;

/// Computes the execute result for one decoded instruction.
///
/// Pure function of the bundle and its operand values; Fence and Unsupported
/// produce an empty result that falls through to `pc + 4`.
pub fn execute(entry: &IdExEntry) -> ExMemEntry {
    let d = &entry.decoded;
    let (a, b) = (entry.rv1, entry.rv2);
    let imm = d.imm as u32;
    let fall_through = d.pc.wrapping_add(INSTRUCTION_SIZE);

    let mut result = ExMemEntry {
        pc: d.pc,
        inst: d.inst,
        inst_type: d.inst_type,
        rd: None,
        wb_value: None,
        next_pc: fall_through,
        mem: None,
    };

    match d.inst_type {
        InstType::OpImm => {
            result.rd = d.rd;
            result.wb_value = Some(Alu::execute(d.alu_op, a, imm));
        }
        InstType::Op => {
            result.rd = d.rd;
            result.wb_value = Some(Alu::execute(d.alu_op, a, b));
        }
        InstType::Lui => {
            result.rd = d.rd;
            result.wb_value = Some(Alu::execute(d.alu_op, 0, imm));
        }
        InstType::Auipc => {
            result.rd = d.rd;
            result.wb_value = Some(Alu::execute(d.alu_op, d.pc, imm));
        }
        InstType::Jal => {
            result.rd = d.rd;
            result.wb_value = Some(fall_through);
            result.next_pc = Bru::relative_target(d.pc, d.imm);
        }
        InstType::Jalr => {
            result.rd = d.rd;
            result.wb_value = Some(fall_through);
            result.next_pc = Bru::jalr_target(a, d.imm);
        }
        InstType::Branch => {
            if let Some(op) = d.branch_op
                && Bru::evaluate(op, a, b)
            {
                result.next_pc = Bru::relative_target(d.pc, d.imm);
            }
        }
        InstType::Load | InstType::Store => {
            if let Some(op) = d.mem_op {
                result.mem = Some(MemAccess {
                    addr: Alu::execute(d.alu_op, a, imm),
                    op,
                    store_data: b,
                });
                if op.is_load() {
                    result.rd = d.rd;
                }
            }
        }
        InstType::Fence | InstType::Unsupported => {}
    }

    result
}

/// Executes the execute stage.
///
/// Consumes ID/EX when EX/MEM is free and raises a redirect for taken
/// branches and jumps.
pub fn execute_stage(cpu: &mut Cpu) {
    if cpu.ex_mem.is_some() {
        return;
    }
    let Some(entry) = cpu.id_ex.take() else {
        return;
    };

    let result = execute(&entry);
    if result.next_pc != entry.decoded.pc.wrapping_add(INSTRUCTION_SIZE) {
        debug!(
            "redirect {:#010x} -> {:#010x}",
            entry.decoded.pc, result.next_pc
        );
        cpu.redirect = Some(result.next_pc);
        cpu.stats.redirects += 1;
    }
    cpu.ex_mem = Some(result);
}
