//! Memory controller implementations for latency modeling.
//!
//! This module provides:
//! 1. **SimpleController:** `fill_base + per_word * (words - 1)` for every transfer.
//! 2. **DramController:** The same burst cost plus a penalty whenever a new DRAM row is opened.

use crate::config::{MemoryConfig, MemoryController as ControllerType};

/// Trait for memory controller implementations that report transfer latency in cycles.
pub trait MemoryController: Send + Sync {
    /// Returns the number of cycles for a transfer of `words` consecutive words at `addr`.
    ///
    /// Always at least 1.
    fn access_latency(&mut self, addr: u32, words: usize) -> u64;
}

/// Builds the controller selected by the configuration.
pub fn from_config(config: &MemoryConfig) -> Box<dyn MemoryController> {
    let simple = SimpleController::new(config.fill_base_latency, config.per_word_latency);
    match config.controller {
        ControllerType::Simple => Box::new(simple),
        ControllerType::Dram => Box::new(DramController::new(
            simple,
            config.row_miss_penalty,
            config.row_bytes,
        )),
    }
}

/// Burst-cost controller: fixed first-word cost plus a per-word increment.
#[derive(Clone, Copy, Debug)]
pub struct SimpleController {
    fill_base: u64,
    per_word: u64,
}

impl SimpleController {
    /// Creates a controller with the given base and per-word latencies (in cycles).
    pub const fn new(fill_base: u64, per_word: u64) -> Self {
        Self {
            fill_base,
            per_word,
        }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u32, words: usize) -> u64 {
        let extra = words.saturating_sub(1) as u64;
        (self.fill_base + self.per_word * extra).max(1)
    }
}

/// DRAM-style controller with an open-row buffer.
#[derive(Clone, Copy, Debug)]
pub struct DramController {
    burst: SimpleController,
    last_row: Option<u32>,
    row_miss_penalty: u64,
    row_mask: u32,
}

impl DramController {
    /// Creates a DRAM controller; `row_bytes` must be a power of two.
    ///
    /// # Arguments
    ///
    /// * `burst` - Cost model for the transfer itself.
    /// * `row_miss_penalty` - Extra cycles when a different row is opened.
    /// * `row_bytes` - Row size in bytes.
    pub const fn new(burst: SimpleController, row_miss_penalty: u64, row_bytes: usize) -> Self {
        Self {
            burst,
            last_row: None,
            row_miss_penalty,
            row_mask: !(row_bytes as u32).wrapping_sub(1),
        }
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: u32, words: usize) -> u64 {
        let row = addr & self.row_mask;
        let base = self.burst.access_latency(addr, words);
        if self.last_row == Some(row) {
            base
        } else {
            self.last_row = Some(row);
            base + self.row_miss_penalty
        }
    }
}
