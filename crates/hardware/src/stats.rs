//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the simulator. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions, and derived metrics (CPI, IPC).
//! 2. **Instruction mix:** Counts by category (load, store, branch, jump, unsupported).
//! 3. **Stalls:** Fetch starvation, memory, and data hazard stall counts.
//! 4. **Cache hierarchy:** Hit, miss and writeback counts for the split L1 caches.
//!
//! Every counter is derived from simulated state only, so two runs of the same image
//! with the same configuration produce identical statistics.

use serde::Serialize;

use crate::core::units::cache::CacheStats;

/// Simulation statistics structure tracking all performance metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions committed (retired).
    pub instructions_retired: u64,

    /// Loads retired.
    pub loads: u64,
    /// Stores retired.
    pub stores: u64,
    /// Conditional branches retired.
    pub branches: u64,
    /// `jal` and `jalr` retired.
    pub jumps: u64,
    /// Unsupported encodings retired as no-ops.
    pub unsupported: u64,

    /// Cycles in which Decode had nothing to work on.
    pub stalls_fetch: u64,
    /// Cycles a memory operation waited for the data cache.
    pub stalls_mem: u64,
    /// Cycles Decode held an instruction because an operand was not yet available.
    pub stalls_data: u64,
    /// Operands supplied by the bypass network instead of the register file.
    pub forwards: u64,
    /// Control transfers that redirected fetch.
    pub redirects: u64,
    /// Fetches discarded because a redirect overtook them.
    pub annulled_fetches: u64,

    /// Instruction cache counters.
    pub icache: CacheStats,
    /// Data cache counters.
    pub dcache: CacheStats,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"core"`, `"instruction_mix"`, `"memory"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "core", "instruction_mix", "memory"];

impl SimStats {
    /// Instructions per cycle, 0 before the first cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_retired as f64 / self.cycles as f64
        }
    }

    /// Cycles per instruction, 0 before the first retirement.
    pub fn cpi(&self) -> f64 {
        if self.instructions_retired == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions_retired as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an empty
    /// slice to print all sections (same as `print()`).
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles.max(1) as f64;
        let instr = self.instructions_retired.max(1) as f64;

        if want("summary") {
            println!("\n==========================================================");
            println!("RV32I PIPELINE SIMULATION STATISTICS");
            println!("==========================================================");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_insts                {}", self.instructions_retired);
            println!("sim_ipc                  {:.4}", self.ipc());
            println!("sim_cpi                  {:.4}", self.cpi());
            println!("----------------------------------------------------------");
        }
        if want("core") {
            println!("CORE BREAKDOWN");
            for (name, value) in [
                ("stalls.fetch ", self.stalls_fetch),
                ("stalls.memory", self.stalls_mem),
                ("stalls.data  ", self.stalls_data),
            ] {
                println!(
                    "  {name}          {value} ({:.2}%)",
                    (value as f64 / cyc) * 100.0
                );
            }
            println!("  forwards               {}", self.forwards);
            println!("  redirects              {}", self.redirects);
            println!("  fetch.annulled         {}", self.annulled_fetches);
            println!("----------------------------------------------------------");
        }
        if want("instruction_mix") {
            println!("INSTRUCTION MIX");
            for (name, value) in [
                ("op.load       ", self.loads),
                ("op.store      ", self.stores),
                ("op.branch     ", self.branches),
                ("op.jump       ", self.jumps),
                ("op.unsupported", self.unsupported),
            ] {
                println!(
                    "  {name}         {value} ({:.2}%)",
                    (value as f64 / instr) * 100.0
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            let print_cache = |name: &str, stats: &CacheStats| {
                let total = stats.hits + stats.misses;
                let miss_rate = if total > 0 {
                    (1.0 - stats.hit_rate()) * 100.0
                } else {
                    0.0
                };
                println!(
                    "  {:<6} accesses: {:<10} | hits: {:<10} | miss_rate: {:.2}% | writebacks: {} | uncached: {}",
                    name, total, stats.hits, miss_rate, stats.writebacks, stats.uncached
                );
            };
            println!("MEMORY HIERARCHY");
            print_cache("L1-I", &self.icache);
            print_cache("L1-D", &self.dcache);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
