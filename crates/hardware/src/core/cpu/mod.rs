//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which serves as the container for the
//! entire processor state. It coordinates the following:
//! 1. **State Management:** Maintains the register file and the fetch program counter.
//! 2. **Pipeline Control:** Holds the inter-stage latches and the outstanding fetch.
//! 3. **Memory Hierarchy:** Owns the split L1 caches and the main memory model.

/// Instruction execution orchestration and pipeline coordination.
pub mod execution;

use crate::common::error::SimError;
use crate::config::Config;
use crate::core::arch::gpr::Gpr;
use crate::core::pipeline::latches::{ExMemEntry, IdExEntry, IfIdEntry, InFlightFetch, MemWbEntry};
use crate::core::units::cache::Cache;
use crate::soc::devices::Mmio;
use crate::soc::memory::{MainMemory, Port};
use crate::stats::SimStats;

/// Main CPU structure containing all processor state and components.
///
/// The CPU moves instructions through the five-stage pipeline, arbitrates the two
/// caches onto main memory, and tracks performance statistics. Every latch is an
/// `Option`; `None` is a bubble.
#[derive(Debug)]
pub struct Cpu {
    /// Integer register file.
    pub regs: Gpr,
    /// Address of the next instruction to fetch.
    pub pc: u32,

    /// IF/ID Latch.
    pub if_id: Option<IfIdEntry>,
    /// ID/EX Latch.
    pub id_ex: Option<IdExEntry>,
    /// EX/MEM Latch.
    pub ex_mem: Option<ExMemEntry>,
    /// Load (or MMIO store) issued to the data cache and waiting for it to complete.
    pub mem_pending: Option<ExMemEntry>,
    /// MEM/WB Latch.
    pub mem_wb: Option<MemWbEntry>,

    /// Instruction fetch outstanding in the instruction cache.
    pub fetch: Option<InFlightFetch>,
    /// Redirect target raised by Execute, consumed by Fetch in the same cycle.
    pub redirect: Option<u32>,
    /// PC of the instruction that issued the data cache's latest request.
    pub dcache_owner: Option<u32>,

    /// L1 Instruction Cache.
    pub icache: Cache,
    /// L1 Data Cache.
    pub dcache: Cache,
    /// Main memory and MMIO devices.
    pub memory: MainMemory,

    /// Performance statistics.
    pub stats: SimStats,
    /// PCs of committed instructions, in order, when tracing is enabled.
    pub commit_trace: Option<Vec<u32>>,
}

impl Cpu {
    /// Creates a new CPU with empty pipeline and cold caches.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulator configuration.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if the configuration does not validate.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let mmio = Mmio::new(config.general.echo_console);
        Ok(Self {
            regs: Gpr::new(),
            pc: config.general.start_pc,
            if_id: None,
            id_ex: None,
            ex_mem: None,
            mem_pending: None,
            mem_wb: None,
            fetch: None,
            redirect: None,
            dcache_owner: None,
            icache: Cache::new(&config.cache.icache, Port::Instruction),
            dcache: Cache::new(&config.cache.dcache, Port::Data),
            memory: MainMemory::new(&config.memory, mmio),
            stats: SimStats::default(),
            commit_trace: None,
        })
    }

    /// Returns the exit code once a program has written the exit register.
    pub const fn exit_code(&self) -> Option<u32> {
        self.memory.mmio().exit_code()
    }

    /// Returns true when no instruction is in flight anywhere in the pipeline.
    pub const fn pipeline_empty(&self) -> bool {
        self.if_id.is_none()
            && self.id_ex.is_none()
            && self.ex_mem.is_none()
            && self.mem_pending.is_none()
            && self.mem_wb.is_none()
            && self.fetch.is_none()
    }
}
