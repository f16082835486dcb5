//! Instruction Fetch (IF) Stage.
//!
//! This module implements the first stage of the instruction pipeline. It performs:
//! 1. **Redirects:** Moves the PC to a target raised by Execute and annuls the fetch in flight.
//! 2. **Delivery:** Moves a completed instruction cache response into IF/ID, or drops it
//!    if it was annulled.
//! 3. **Issue:** Checks the PC and requests the next instruction, predicting `pc + 4`.
//!
//! At most one fetch is outstanding at a time.

use tracing::{debug, trace};

use crate::common::constants::{INSTRUCTION_NOP, INSTRUCTION_SIZE};
use crate::common::error::SimError;
use crate::core::Cpu;
use crate::core::pipeline::latches::{FetchFault, IfIdEntry, InFlightFetch};
use crate::core::units::cache::CacheRequest;
use crate::soc::memory_map::{Region, classify};

/// Checks that `pc` can be fetched from.
pub const fn check_pc(pc: u32, dram_size: usize) -> Option<FetchFault> {
    if pc % INSTRUCTION_SIZE != 0 {
        Some(FetchFault::Misaligned)
    } else if !matches!(classify(pc, dram_size), Region::Dram) {
        Some(FetchFault::OutOfRange)
    } else {
        None
    }
}

/// Executes the instruction fetch stage.
///
/// # Errors
///
/// `CacheProtocolViolation` if the instruction cache rejects a request.
pub fn fetch_stage(cpu: &mut Cpu) -> Result<(), SimError> {
    if let Some(target) = cpu.redirect.take() {
        cpu.pc = target;
        if let Some(fetch) = cpu.fetch.as_mut()
            && !fetch.annulled
        {
            debug!("annulling fetch of {:#010x}", fetch.pc);
            fetch.annulled = true;
            cpu.stats.annulled_fetches += 1;
        }
    }

    if let Some(fetch) = cpu.fetch {
        if fetch.annulled {
            if cpu.icache.take_response().is_some() {
                trace!("fetch {:#010x}: discarded annulled response", fetch.pc);
                cpu.fetch = None;
            }
        } else if cpu.if_id.is_none()
            && let Some(response) = cpu.icache.take_response()
        {
            trace!("fetch {:#010x}: {:#010x}", fetch.pc, response.data);
            cpu.if_id = Some(IfIdEntry {
                pc: fetch.pc,
                inst: response.data,
                fault: None,
            });
            cpu.fetch = None;
        }
    }

    if cpu.if_id.is_none() {
        cpu.stats.stalls_fetch += 1;
    }

    if cpu.fetch.is_some() || !cpu.icache.is_ready() {
        return Ok(());
    }

    let pc = cpu.pc;
    if let Some(fault) = check_pc(pc, cpu.memory.size()) {
        if cpu.if_id.is_none() {
            cpu.if_id = Some(IfIdEntry {
                pc,
                inst: INSTRUCTION_NOP,
                fault: Some(fault),
            });
        }
        return Ok(());
    }

    cpu.icache
        .request(CacheRequest::read(pc))
        .map_err(|e| SimError::from_mem(e, pc, cpu.stats.cycles))?;
    cpu.fetch = Some(InFlightFetch {
        pc,
        annulled: false,
    });
    cpu.pc = pc.wrapping_add(INSTRUCTION_SIZE);
    Ok(())
}
