//! RISC-V General-Purpose Register File.
//!
//! This module implements the General-Purpose Register (GPR) file for RV32I.
//! It performs the following:
//! 1. **Storage:** Maintains 32 integer registers (`x0`-`x31`).
//! 2. **Invariant Enforcement:** Ensures that register `x0` is hardwired to zero.
//! 3. **Debugging:** Provides a snapshot and a formatted dump of the register state.

use crate::common::constants::NUM_REGS;

/// General-Purpose Register file.
///
/// Register `x0` is hardwired to zero and cannot be modified. Out-of-range
/// indices read as zero and are ignored on write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gpr {
    regs: [u32; NUM_REGS],
}

impl Gpr {
    /// Creates a register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register value.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    ///
    /// # Returns
    ///
    /// The 32-bit value stored in the specified register. Register `x0` always returns 0.
    pub fn read(&self, idx: usize) -> u32 {
        if idx == 0 {
            0
        } else {
            self.regs.get(idx).copied().unwrap_or(0)
        }
    }

    /// Writes a value to a general-purpose register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    /// * `val` - The 32-bit value to write. Writes to `x0` are discarded.
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != 0
            && let Some(reg) = self.regs.get_mut(idx)
        {
            *reg = val;
        }
    }

    /// Returns a copy of all 32 registers.
    pub const fn snapshot(&self) -> [u32; NUM_REGS] {
        self.regs
    }

    /// Formats the register file in pairs, one pair per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..NUM_REGS).step_by(2) {
            out.push_str(&format!(
                "x{:<2}={:#010x} x{:<2}={:#010x}\n",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            ));
        }
        out
    }
}
