//! System-wide constants.
//!
//! The MMIO addresses are fixed: existing test programs and their golden outputs
//! depend on them.

/// Size of every RV32I instruction in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Number of architectural integer registers.
pub const NUM_REGS: usize = 32;

/// Bytes per machine word.
pub const WORD_BYTES: u32 = 4;

/// Write: emit the low byte of the stored value as one console character.
pub const MMIO_CONSOLE_BYTE: u32 = 0x4000_0000;

/// Write: emit the stored value as a signed decimal integer.
pub const MMIO_CONSOLE_INT: u32 = 0x4000_0004;

/// Write: terminate the simulation and record the stored value as exit status.
pub const MMIO_EXIT: u32 = 0x4000_1000;

/// Read: return the next externally supplied argument word.
pub const MMIO_ARG: u32 = 0x4000_3000;

/// Lowest address of the MMIO window; DRAM must end at or below this.
pub const MMIO_WINDOW_BASE: u32 = 0x4000_0000;

/// ADDI x0, x0, 0 (canonical NOP).
pub const INSTRUCTION_NOP: u32 = 0x0000_0013;
