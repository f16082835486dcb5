//! Writeback (WB) Stage.
//!
//! This module implements the final stage of the instruction pipeline. It
//! commits results to the register file, counts retired instructions and
//! records per-class statistics.

use tracing::trace;

use crate::core::Cpu;
use crate::core::pipeline::signals::InstType;
use crate::isa::disasm::disassemble;

/// Executes the writeback stage of the pipeline.
///
/// Writes the MEM/WB value to its destination register unless the destination is
/// absent or `x0`. Unsupported instructions carry no destination and only count.
pub fn wb_stage(cpu: &mut Cpu) {
    let Some(entry) = cpu.mem_wb.take() else {
        return;
    };

    if let (Some(rd), Some(value)) = (entry.rd, entry.value) {
        cpu.regs.write(rd, value);
    }

    cpu.stats.instructions_retired += 1;
    match entry.inst_type {
        InstType::Load => cpu.stats.loads += 1,
        InstType::Store => cpu.stats.stores += 1,
        InstType::Branch => cpu.stats.branches += 1,
        InstType::Jal | InstType::Jalr => cpu.stats.jumps += 1,
        InstType::Unsupported => cpu.stats.unsupported += 1,
        InstType::OpImm
        | InstType::Op
        | InstType::Lui
        | InstType::Auipc
        | InstType::Fence => {}
    }

    if let Some(trace) = cpu.commit_trace.as_mut() {
        trace.push(entry.pc);
    }
    trace!(
        "commit {:#010x}: {} rd={:?} value={:?}",
        entry.pc,
        disassemble(entry.inst),
        entry.rd,
        entry.value
    );
}
