//! Data Hazard Detection and Forwarding.
//!
//! This module implements the logic for maintaining pipeline consistency when data
//! dependencies exist between instructions. It provides:
//! 1. **Operand Forwarding:** Resolves Read-After-Write (RAW) hazards by bypassing the
//!    register file with results still travelling down the pipeline.
//! 2. **Hazard Detection:** Identifies load-use hazards that require a stall in Decode.
//!
//! Stages run in reverse order within a cycle, so by the time Decode looks, `ex_mem`
//! already holds the instruction Execute produced this cycle and Writeback has already
//! committed `mem_wb`'s predecessor to the register file.

use crate::core::Cpu;
use crate::core::pipeline::latches::ExMemEntry;

/// Where an operand value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// No older in-flight instruction writes the register.
    Register(u32),
    /// Bypassed from an in-flight producer.
    Forwarded(u32),
    /// A producer exists but its value is not available yet.
    Stall,
}

impl Operand {
    /// The value, unless a stall is required.
    pub const fn value(self) -> Option<u32> {
        match self {
            Self::Register(v) | Self::Forwarded(v) => Some(v),
            Self::Stall => None,
        }
    }
}

fn writes(entry: &ExMemEntry, reg: usize) -> bool {
    entry.rd == Some(reg)
}

/// Resolves one source operand for the instruction in Decode.
///
/// Producers are checked youngest first: `ex_mem`, the load waiting in
/// `mem_pending`, `mem_wb`, and finally the register file. `x0` and unused
/// operands never create a hazard and read as 0.
///
/// # Examples
///
/// ```text
/// ex_mem: lw  x1, 0(x2)     <- value not back yet
/// if_id:  add x3, x1, x4    -> Operand::Stall for rs1
/// ```
pub fn resolve_operand(cpu: &Cpu, reg: Option<usize>) -> Operand {
    let Some(reg) = reg.filter(|&r| r != 0) else {
        return Operand::Register(0);
    };

    if let Some(ex) = cpu.ex_mem.as_ref().filter(|e| writes(e, reg)) {
        return ex.wb_value.map_or(Operand::Stall, Operand::Forwarded);
    }

    if cpu.mem_pending.as_ref().is_some_and(|e| writes(e, reg)) {
        return Operand::Stall;
    }

    if let Some(wb) = cpu.mem_wb.as_ref().filter(|e| e.rd == Some(reg)) {
        return wb.value.map_or(Operand::Stall, Operand::Forwarded);
    }

    Operand::Register(cpu.regs.read(reg))
}

/// Returns true if either operand of a pending decode must wait for a load.
pub fn need_stall_load_use(cpu: &Cpu, rs1: Option<usize>, rs2: Option<usize>) -> bool {
    resolve_operand(cpu, rs1) == Operand::Stall || resolve_operand(cpu, rs2) == Operand::Stall
}
