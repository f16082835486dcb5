//! Pipeline latch structures for inter-stage communication.
//!
//! Each latch holds at most one instruction and is modelled as `Option<Entry>`;
//! `None` is a bubble. The entries are:
//! 1. **IF/ID:** Raw instruction word (or a fetch fault to be raised in order).
//! 2. **ID/EX:** Decoded control bundle plus resolved operand values.
//! 3. **EX/MEM:** Execute result: next PC, write-back value and optional memory access.
//! 4. **MEM/WB:** Final register write.

use crate::common::error::SimError;
use crate::core::pipeline::signals::{AluOp, BranchOp, InstType, MemOp};

/// Why a fetch could not be issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchFault {
    /// PC is not word-aligned.
    Misaligned,
    /// PC is outside DRAM.
    OutOfRange,
}

impl FetchFault {
    /// Converts the fault into the run-level error for the instruction at `pc`.
    pub const fn into_error(self, pc: u32, cycle: u64) -> SimError {
        match self {
            Self::Misaligned => SimError::MisalignedAccess {
                addr: pc,
                pc,
                cycle,
            },
            Self::OutOfRange => SimError::MemoryOutOfRange {
                addr: pc,
                pc,
                cycle,
            },
        }
    }
}

/// Entry in the IF/ID pipeline latch (Fetch to Decode stage).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IfIdEntry {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Fault detected at fetch, raised when the entry reaches Decode.
    pub fault: Option<FetchFault>,
}

/// Control bundle produced by the decoder for one instruction.
///
/// Register indices are `None` when the instruction format does not use them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedInst {
    /// Instruction class.
    pub inst_type: InstType,
    /// ALU operation.
    pub alu_op: AluOp,
    /// Branch comparison (branches only).
    pub branch_op: Option<BranchOp>,
    /// Memory function (loads and stores only).
    pub mem_op: Option<MemOp>,
    /// First source register.
    pub rs1: Option<usize>,
    /// Second source register.
    pub rs2: Option<usize>,
    /// Destination register.
    pub rd: Option<usize>,
    /// Sign-extended immediate.
    pub imm: i32,
    /// Program counter of the instruction.
    pub pc: u32,
    /// Raw encoding.
    pub inst: u32,
}

impl DecodedInst {
    /// A bundle with no sources, destination or side effects.
    pub const fn nop(inst_type: InstType, pc: u32, inst: u32) -> Self {
        Self {
            inst_type,
            alu_op: AluOp::Add,
            branch_op: None,
            mem_op: None,
            rs1: None,
            rs2: None,
            rd: None,
            imm: 0,
            pc,
            inst,
        }
    }
}

/// Entry in the ID/EX pipeline latch (Decode to Execute stage).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdExEntry {
    /// Decoded control bundle.
    pub decoded: DecodedInst,
    /// Value of rs1 (0 when unused).
    pub rv1: u32,
    /// Value of rs2 (0 when unused).
    pub rv2: u32,
}

/// Memory access computed by Execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemAccess {
    /// Effective byte address.
    pub addr: u32,
    /// Load or store, width and signedness.
    pub op: MemOp,
    /// Register value to store (stores only).
    pub store_data: u32,
}

/// Entry in the EX/MEM pipeline latch (Execute to Memory stage).
///
/// Also used for the load waiting on its data cache response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExMemEntry {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Instruction class.
    pub inst_type: InstType,
    /// Destination register, if the instruction writes one.
    pub rd: Option<usize>,
    /// Write-back value when already known (unknown for loads until their data returns).
    pub wb_value: Option<u32>,
    /// Address of the next instruction on the architectural path.
    pub next_pc: u32,
    /// Memory access, for loads and stores.
    pub mem: Option<MemAccess>,
}

/// Entry in the MEM/WB pipeline latch (Memory to Writeback stage).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemWbEntry {
    /// Program counter of the instruction.
    pub pc: u32,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Instruction class.
    pub inst_type: InstType,
    /// Destination register, if any.
    pub rd: Option<usize>,
    /// Value to commit.
    pub value: Option<u32>,
}

/// An instruction fetch issued to the instruction cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InFlightFetch {
    /// PC the fetch was issued for.
    pub pc: u32,
    /// Set by a redirect; the response is discarded on arrival.
    pub annulled: bool,
}
