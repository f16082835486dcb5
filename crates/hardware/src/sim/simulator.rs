//! Simulator: the public driver around a [`Cpu`].
//!
//! The simulator owns one CPU context and adds the things a caller needs around it:
//! 1. **Loading:** Places a [`MemoryImage`] into main memory and sets the entry PC.
//! 2. **Running:** Ticks until the program exits, a fault occurs or a cycle budget runs out.
//! 3. **Observation:** Registers, console output, coherent memory reads and statistics,
//!    plus a serializable [`StateDump`] for golden comparisons.

use serde::Serialize;
use tracing::{debug, info};

use super::loader::MemoryImage;
use crate::common::constants::{NUM_REGS, WORD_BYTES};
use crate::common::error::{LoadError, SimError};
use crate::config::Config;
use crate::core::Cpu;
use crate::soc::devices::ConsoleEvent;
use crate::stats::SimStats;

/// How a call to [`Simulator::run`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// The program wrote the exit register with this status.
    Exited(u32),
    /// The cycle budget was spent before the program exited.
    CycleLimit,
}

/// Serializable end-of-run state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateDump {
    /// Registers `x0`..`x31`.
    pub regs: [u32; NUM_REGS],
    /// Fetch PC.
    pub pc: u32,
    /// Exit status, if the program exited.
    pub exit_code: Option<u32>,
    /// Console text.
    pub console: String,
    /// Console writes in order.
    pub console_events: Vec<ConsoleEvent>,
    /// Statistics at the time of the dump.
    pub stats: SimStats,
    /// Requested memory words as `(address, value)` pairs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<(u32, u32)>,
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    /// Processor state (pipeline, caches, main memory, statistics).
    pub cpu: Cpu,
    fault: Option<SimError>,
}

impl Simulator {
    /// Creates a simulator with empty memory.
    ///
    /// # Errors
    ///
    /// `SimError::Config` if `config` does not validate.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        Ok(Self {
            cpu: Cpu::new(config)?,
            fault: None,
        })
    }

    /// Copies every segment of `image` into main memory and moves the PC to its
    /// entry point, if it has one.
    ///
    /// # Errors
    ///
    /// `LoadError::SegmentOutOfRange` when a segment does not fit in main memory.
    /// Segments before the failing one stay loaded.
    pub fn load_image(&mut self, image: &MemoryImage) -> Result<(), SimError> {
        let size = self.cpu.memory.size();
        for segment in &image.segments {
            let out_of_range = || LoadError::SegmentOutOfRange {
                addr: segment.addr,
                len: segment.data.len(),
                size,
            };
            if segment.end() > size {
                return Err(out_of_range().into());
            }
            self.cpu
                .memory
                .load_bytes(segment.addr, &segment.data)
                .map_err(|_| out_of_range())?;
            debug!(
                "loaded {} bytes at {:#010x}",
                segment.data.len(),
                segment.addr
            );
        }
        if let Some(entry) = image.entry {
            self.cpu.pc = entry;
        }
        Ok(())
    }

    /// Replaces the queue of words returned by the argument register.
    pub fn set_args(&mut self, args: impl IntoIterator<Item = u32>) {
        self.cpu.memory.mmio_mut().set_args(args);
    }

    /// Records the PC of every committed instruction from now on.
    pub fn enable_commit_trace(&mut self) {
        self.cpu.commit_trace.get_or_insert_with(Vec::new);
    }

    /// PCs committed since [`Simulator::enable_commit_trace`], in order.
    pub fn commit_trace(&self) -> &[u32] {
        self.cpu.commit_trace.as_deref().unwrap_or_default()
    }

    /// Advances the simulator by one clock cycle.
    ///
    /// Once a fault has occurred every further call returns the same fault.
    ///
    /// # Errors
    ///
    /// The fault raised by the pipeline or memory system.
    pub fn tick(&mut self) -> Result<(), SimError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        self.cpu.tick().inspect_err(|e| {
            self.fault = Some(e.clone());
        })
    }

    /// Runs until the program exits or `max_cycles` more cycles have elapsed.
    ///
    /// # Errors
    ///
    /// The first fault raised while running.
    pub fn run(&mut self, max_cycles: u64) -> Result<RunOutcome, SimError> {
        let start = self.cpu.stats.cycles;
        loop {
            if let Some(code) = self.exit_code() {
                info!(
                    "exited with {} after {} cycles, {} instructions",
                    code, self.cpu.stats.cycles, self.cpu.stats.instructions_retired
                );
                return Ok(RunOutcome::Exited(code));
            }
            if self.cpu.stats.cycles - start >= max_cycles {
                info!("cycle limit of {} reached", max_cycles);
                return Ok(RunOutcome::CycleLimit);
            }
            self.tick()?;
        }
    }

    /// Reads integer register `idx`.
    pub fn reg(&self, idx: usize) -> u32 {
        self.cpu.regs.read(idx)
    }

    /// All 32 integer registers.
    pub const fn regs(&self) -> [u32; NUM_REGS] {
        self.cpu.regs.snapshot()
    }

    /// Next fetch address.
    pub const fn pc(&self) -> u32 {
        self.cpu.pc
    }

    /// Exit status, once the program has exited.
    pub const fn exit_code(&self) -> Option<u32> {
        self.cpu.exit_code()
    }

    /// Console text written so far.
    pub fn console_output(&self) -> &str {
        self.cpu.memory.mmio().console_output()
    }

    /// Console writes in order.
    pub fn console_events(&self) -> &[ConsoleEvent] {
        self.cpu.memory.mmio().events()
    }

    /// Reads the word at `addr` as the program would see it: a resident data cache
    /// line wins over main memory. Returns `None` outside DRAM or when misaligned.
    pub fn read_word(&self, addr: u32) -> Option<u32> {
        if addr % WORD_BYTES != 0 {
            return None;
        }
        self.cpu
            .dcache
            .peek_word(addr)
            .or_else(|| self.cpu.memory.read_word(addr))
    }

    /// Statistics so far.
    pub const fn stats(&self) -> &SimStats {
        &self.cpu.stats
    }

    /// Writes every dirty data cache line back to main memory without timing.
    pub fn flush_caches(&mut self) {
        self.cpu.dcache.flush_dirty(&mut self.cpu.memory);
        self.cpu.icache.flush_dirty(&mut self.cpu.memory);
    }

    /// Captures the architectural state plus the words at `addrs`.
    pub fn dump(&self, addrs: &[u32]) -> StateDump {
        StateDump {
            regs: self.regs(),
            pc: self.pc(),
            exit_code: self.exit_code(),
            console: self.console_output().to_string(),
            console_events: self.console_events().to_vec(),
            stats: self.cpu.stats,
            memory: addrs
                .iter()
                .filter_map(|&addr| self.read_word(addr).map(|v| (addr, v)))
                .collect(),
        }
    }
}
