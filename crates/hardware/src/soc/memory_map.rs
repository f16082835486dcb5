//! Physical address map.
//!
//! DRAM starts at address 0 and spans the configured memory size. The MMIO
//! registers sit at fixed addresses in the `0x4000_0000` window; each occupies
//! one word, so byte and halfword accesses inside a register reach it too.
//! Everything else is unmapped.

use crate::common::constants::{MMIO_ARG, MMIO_CONSOLE_BYTE, MMIO_CONSOLE_INT, MMIO_EXIT};

/// MMIO registers recognised by the address decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MmioRegister {
    /// Write: emit one character.
    ConsoleByte,
    /// Write: emit a signed decimal integer.
    ConsoleInt,
    /// Write: terminate with the written status.
    Exit,
    /// Read: next supplied argument word.
    Arg,
}

impl MmioRegister {
    /// Word address of the register.
    pub const fn addr(self) -> u32 {
        match self {
            Self::ConsoleByte => MMIO_CONSOLE_BYTE,
            Self::ConsoleInt => MMIO_CONSOLE_INT,
            Self::Exit => MMIO_EXIT,
            Self::Arg => MMIO_ARG,
        }
    }
}

/// Result of decoding a physical address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    /// Ordinary cacheable memory.
    Dram,
    /// Device register, always accessed uncached.
    Mmio(MmioRegister),
    /// Nothing lives here.
    Unmapped,
}

/// Decodes `addr` against a DRAM of `dram_size` bytes.
pub const fn classify(addr: u32, dram_size: usize) -> Region {
    if (addr as usize) < dram_size {
        return Region::Dram;
    }
    match addr & !0x3 {
        MMIO_CONSOLE_BYTE => Region::Mmio(MmioRegister::ConsoleByte),
        MMIO_CONSOLE_INT => Region::Mmio(MmioRegister::ConsoleInt),
        MMIO_EXIT => Region::Mmio(MmioRegister::Exit),
        MMIO_ARG => Region::Mmio(MmioRegister::Arg),
        _ => Region::Unmapped,
    }
}

/// True when `addr` decodes to an MMIO register.
pub const fn is_mmio(addr: u32, dram_size: usize) -> bool {
    matches!(classify(addr, dram_size), Region::Mmio(_))
}
