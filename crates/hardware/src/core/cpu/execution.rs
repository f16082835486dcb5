//! Main Execution Loop.
//!
//! This module implements the core execution cycle of the CPU. Each call to
//! [`Cpu::tick`] advances the machine by exactly one clock:
//! 1. **Pipeline:** Stages run back to front (WB, MEM, EX, ID, IF) so every stage
//!    reads the latch contents left by the previous cycle.
//! 2. **Memory System:** The data cache steps first and so wins arbitration for
//!    main memory, then the instruction cache, then main memory itself.
//! 3. **Accounting:** Cache counters are folded into the statistics and the cycle
//!    counter advances.

use tracing::trace;

use super::Cpu;
use crate::common::error::SimError;
use crate::core::pipeline::stages::{decode_stage, execute_stage, fetch_stage, mem_stage, wb_stage};

impl Cpu {
    /// Advances the processor by one cycle.
    ///
    /// # Errors
    ///
    /// Any fault raised by a stage (misaligned or out-of-range access, cache
    /// protocol violation). The machine state is left as it was when the fault
    /// was detected.
    pub fn tick(&mut self) -> Result<(), SimError> {
        wb_stage(self);
        mem_stage(self)?;
        execute_stage(self);
        decode_stage(self)?;
        fetch_stage(self)?;

        // Cache faults are charged to the instruction whose request is being served.
        let cycle = self.stats.cycles;
        let data_pc = self.dcache_owner.unwrap_or(self.pc);
        let fetch_pc = self.fetch.map_or(self.pc, |f| f.pc);
        self.dcache
            .tick(&mut self.memory)
            .map_err(|e| SimError::from_mem(e, data_pc, cycle))?;
        self.icache
            .tick(&mut self.memory)
            .map_err(|e| SimError::from_mem(e, fetch_pc, cycle))?;
        self.memory.tick();

        self.stats.icache = self.icache.stats();
        self.stats.dcache = self.dcache.stats();
        self.stats.cycles += 1;

        if self.stats.cycles % 1_000_000 == 0 {
            trace!(
                "cycle {}: retired {} pc={:#010x}",
                self.stats.cycles, self.stats.instructions_retired, self.pc
            );
        }
        Ok(())
    }
}
