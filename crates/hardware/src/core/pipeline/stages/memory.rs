//! Memory Access (MEM) Stage.
//!
//! This module implements the fourth stage of the instruction pipeline. It performs:
//! 1. **Load Completion:** Collects the data cache response for the outstanding load,
//!    then aligns and sign/zero extends it.
//! 2. **Access Checking:** Width alignment and address map validation.
//! 3. **Request Issue:** Converts loads and stores into word requests with byte lanes.
//!    A DRAM store retires as soon as the cache accepts it. An MMIO store waits until
//!    the device has acknowledged the write, so nothing younger commits past an exit.
//!
//! Instructions leave this stage in program order: nothing overtakes a load
//! that is still waiting for its data.

use tracing::trace;

use crate::common::constants::WORD_BYTES;
use crate::common::error::{MemError, SimError};
use crate::core::Cpu;
use crate::core::pipeline::latches::{ExMemEntry, MemAccess, MemWbEntry};
use crate::core::pipeline::signals::{MemKind, MemOp, MemWidth};
use crate::core::units::cache::CacheRequest;
use crate::soc::memory_map::{Region, classify};

/// Byte-enable mask for an access of `width` at byte offset `offset` within its word.
pub const fn byte_enable(width: MemWidth, offset: u32) -> u8 {
    let lanes: u8 = match width {
        MemWidth::Byte => 0b0001,
        MemWidth::Half => 0b0011,
        MemWidth::Word => 0b1111,
    };
    lanes << offset
}

/// Extracts and extends a loaded value from the word read at the aligned address.
pub const fn extract_load(word: u32, offset: u32, op: MemOp) -> u32 {
    let shifted = word >> (offset * 8);
    match (op.width, op.signed) {
        (MemWidth::Byte, true) => shifted as u8 as i8 as i32 as u32,
        (MemWidth::Byte, false) => shifted & 0xFF,
        (MemWidth::Half, true) => shifted as u16 as i16 as i32 as u32,
        (MemWidth::Half, false) => shifted & 0xFFFF,
        (MemWidth::Word, _) => word,
    }
}

/// Validates an access and builds its word-granular cache request.
///
/// # Errors
///
/// * `MisalignedAccess` when the address is not a multiple of the access width.
/// * `MemoryOutOfRange` when the address is neither DRAM nor an MMIO register.
pub fn build_request(
    access: &MemAccess,
    dram_size: usize,
    pc: u32,
    cycle: u64,
) -> Result<CacheRequest, SimError> {
    let addr = access.addr;
    if addr % access.op.width.bytes() != 0 {
        return Err(SimError::MisalignedAccess { addr, pc, cycle });
    }
    if classify(addr, dram_size) == Region::Unmapped {
        return Err(SimError::MemoryOutOfRange { addr, pc, cycle });
    }

    let offset = addr % WORD_BYTES;
    let word_addr = addr - offset;
    Ok(match access.op.kind {
        MemKind::Load => CacheRequest::read(word_addr),
        MemKind::Store => CacheRequest::write(
            word_addr,
            access.store_data << (offset * 8),
            byte_enable(access.op.width, offset),
        ),
    })
}

const fn retire(entry: &ExMemEntry, value: Option<u32>) -> MemWbEntry {
    MemWbEntry {
        pc: entry.pc,
        inst: entry.inst,
        inst_type: entry.inst_type,
        rd: entry.rd,
        value,
    }
}

/// Executes the memory stage.
///
/// # Errors
///
/// Alignment and address map violations, and `CacheProtocolViolation` if the data
/// cache rejects a request this stage believed it could accept.
pub fn mem_stage(cpu: &mut Cpu) -> Result<(), SimError> {
    let cycle = cpu.stats.cycles;

    if let Some(pending) = cpu.mem_pending {
        let Some(access) = pending.mem else {
            return Err(SimError::CacheProtocolViolation {
                pc: pending.pc,
                cycle,
                source: MemError::UnexpectedResponse,
            });
        };
        let value = if access.op.is_load() {
            let Some(response) = cpu.dcache.take_response() else {
                cpu.stats.stalls_mem += 1;
                return Ok(());
            };
            let value = extract_load(response.data, access.addr % WORD_BYTES, access.op);
            trace!("load {:#010x} -> {value:#010x}", access.addr);
            Some(value)
        } else {
            if cpu.dcache.is_busy() {
                cpu.stats.stalls_mem += 1;
                return Ok(());
            }
            trace!("device store {:#010x} acknowledged", access.addr);
            None
        };
        cpu.mem_pending = None;
        cpu.mem_wb = Some(retire(&pending, value));
    }

    let Some(entry) = cpu.ex_mem else {
        return Ok(());
    };

    let Some(access) = entry.mem else {
        if cpu.mem_wb.is_none() && cpu.mem_pending.is_none() {
            cpu.ex_mem = None;
            cpu.mem_wb = Some(retire(&entry, entry.wb_value));
        }
        return Ok(());
    };

    // Loads and MMIO stores park in mem_pending; a DRAM store retires straight into mem_wb.
    let parks = access.op.is_load()
        || matches!(classify(access.addr, cpu.memory.size()), Region::Mmio(_));
    let slot_busy = if parks {
        cpu.mem_pending.is_some()
    } else {
        cpu.mem_wb.is_some() || cpu.mem_pending.is_some()
    };
    if slot_busy {
        return Ok(());
    }

    let request = build_request(&access, cpu.memory.size(), entry.pc, cycle)?;
    if !cpu.dcache.is_ready() {
        cpu.stats.stalls_mem += 1;
        return Ok(());
    }
    cpu.dcache
        .request(request)
        .map_err(|e| SimError::from_mem(e, entry.pc, cycle))?;
    cpu.dcache_owner = Some(entry.pc);
    cpu.ex_mem = None;

    if parks {
        cpu.mem_pending = Some(entry);
    } else {
        trace!("store {:#010x} <- {:#010x}", access.addr, access.store_data);
        cpu.mem_wb = Some(retire(&entry, None));
    }
    Ok(())
}
