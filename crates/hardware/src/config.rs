//! Configuration system for the RV32I simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (memory size, latencies, cache geometry).
//! 2. **Structures:** Hierarchical config for general, memory and cache settings.
//! 3. **Enums:** Memory controller, cache associativity and replacement policy.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built with `Config::default()`
//! and adjusted field by field, which is what the CLI does for its flags.

use serde::{Deserialize, Serialize};

use crate::common::constants::{MMIO_WINDOW_BASE, WORD_BYTES};
use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Main memory backing store size (16 MiB).
    pub const MEMORY_SIZE: usize = 16 * 1024 * 1024;

    /// Address of the first instruction fetched.
    pub const START_PC: u32 = 0;

    /// Cycle budget for `Simulator::run` when the caller does not supply one.
    pub const MAX_CYCLES: u64 = 50_000_000;

    /// Fixed cost of a line transfer in cycles (first word).
    pub const FILL_BASE_LATENCY: u64 = 20;

    /// Cost of every additional word in a line transfer.
    pub const PER_WORD_LATENCY: u64 = 1;

    /// Extra cycles when a DRAM access opens a new row.
    pub const ROW_MISS_PENALTY: u64 = 20;

    /// Bytes per DRAM row.
    pub const ROW_BYTES: usize = 2048;

    /// Latency of an uncached MMIO word access.
    pub const MMIO_LATENCY: u64 = 1;

    /// Words per cache line (16 words = 512 bits).
    pub const LINE_WORDS: usize = 16;

    /// Sets per cache.
    pub const SETS: usize = 64;
}

/// Memory controller timing models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryController {
    /// Every line transfer costs `fill_base_latency + per_word_latency * (words - 1)`.
    #[default]
    Simple,
    /// As `Simple`, plus a row miss penalty whenever a different DRAM row is opened.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Cache associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Associativity {
    /// One way per set.
    #[serde(alias = "direct-mapped", alias = "direct")]
    DirectMapped,
    /// Two ways per set.
    #[default]
    #[serde(alias = "two-way")]
    TwoWay,
}

impl Associativity {
    /// Number of ways per set.
    pub const fn ways(self) -> usize {
        match self {
            Self::DirectMapped => 1,
            Self::TwoWay => 2,
        }
    }

    /// Maps a way count to an associativity, if supported.
    pub const fn from_ways(ways: usize) -> Option<Self> {
        match ways {
            1 => Some(Self::DirectMapped),
            2 => Some(Self::TwoWay),
            _ => None,
        }
    }
}

/// Cache replacement policy algorithms.
///
/// Both policies are deterministic so identical stimulus always produces
/// the same eviction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used: evicts the way touched longest ago.
    #[default]
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
    /// First In First Out: evicts ways in fill order (round-robin).
    #[serde(alias = "Fifo", alias = "fifo")]
    Fifo,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use rv32sim_core::config::{Associativity, Config};
///
/// let config = Config::default();
/// assert_eq!(config.memory.size_bytes, 16 * 1024 * 1024);
/// assert_eq!(config.cache.dcache.associativity, Associativity::TwoWay);
///
/// let json = r#"{ "cache": { "dcache": { "associativity": "DirectMapped" } } }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cache.dcache.associativity.ways(), 1);
/// assert_eq!(config.cache.icache.line_words, 16);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Main memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Instruction and data cache settings.
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
}

impl Config {
    /// Parses a configuration from JSON and validates it.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON or unknown enum values, and any
    /// error from [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks geometry and memory size constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotPowerOfTwo` when a cache's line size or set count is
    /// zero or not a power of two, and `ConfigError::MemorySize` when main memory is
    /// empty, not a whole number of lines, or reaches into the MMIO window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.icache.validate()?;
        self.cache.dcache.validate()?;
        if !self.memory.row_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "memory.row_bytes",
                value: self.memory.row_bytes,
            });
        }

        let line_bytes = self
            .cache
            .icache
            .line_bytes()
            .max(self.cache.dcache.line_bytes());
        let size = self.memory.size_bytes;
        if size == 0 || size % line_bytes != 0 || size > MMIO_WINDOW_BASE as usize {
            return Err(ConfigError::MemorySize {
                size,
                line_bytes,
                limit: MMIO_WINDOW_BASE,
            });
        }
        Ok(())
    }
}

/// General simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// PC of the first fetched instruction (an ELF entry point overrides it).
    #[serde(default = "GeneralConfig::default_start_pc")]
    pub start_pc: u32,

    /// Cycle budget used by the CLI when `--max-cycles` is not given.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,

    /// Echo console MMIO output to stdout as it is produced.
    #[serde(default)]
    pub echo_console: bool,
}

impl GeneralConfig {
    const fn default_start_pc() -> u32 {
        defaults::START_PC
    }

    const fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_pc: defaults::START_PC,
            max_cycles: defaults::MAX_CYCLES,
            echo_console: false,
        }
    }
}

/// Main memory timing and size configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Backing store size in bytes.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: usize,

    /// Timing model.
    #[serde(default)]
    pub controller: MemoryController,

    /// Cycles for the first word of a line transfer.
    #[serde(default = "MemoryConfig::default_fill_base")]
    pub fill_base_latency: u64,

    /// Cycles for every additional word of a line transfer.
    #[serde(default = "MemoryConfig::default_per_word")]
    pub per_word_latency: u64,

    /// Row miss penalty (`Dram` controller only).
    #[serde(default = "MemoryConfig::default_row_miss")]
    pub row_miss_penalty: u64,

    /// DRAM row size in bytes (`Dram` controller only).
    #[serde(default = "MemoryConfig::default_row_bytes")]
    pub row_bytes: usize,

    /// Cycles for an uncached MMIO word access.
    #[serde(default = "MemoryConfig::default_mmio_latency")]
    pub mmio_latency: u64,
}

impl MemoryConfig {
    const fn default_size() -> usize {
        defaults::MEMORY_SIZE
    }

    const fn default_fill_base() -> u64 {
        defaults::FILL_BASE_LATENCY
    }

    const fn default_per_word() -> u64 {
        defaults::PER_WORD_LATENCY
    }

    const fn default_row_miss() -> u64 {
        defaults::ROW_MISS_PENALTY
    }

    const fn default_row_bytes() -> usize {
        defaults::ROW_BYTES
    }

    const fn default_mmio_latency() -> u64 {
        defaults::MMIO_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_SIZE,
            controller: MemoryController::default(),
            fill_base_latency: defaults::FILL_BASE_LATENCY,
            per_word_latency: defaults::PER_WORD_LATENCY,
            row_miss_penalty: defaults::ROW_MISS_PENALTY,
            row_bytes: defaults::ROW_BYTES,
            mmio_latency: defaults::MMIO_LATENCY,
        }
    }
}

/// Cache hierarchy configuration: split L1 instruction and data caches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    /// Instruction cache.
    #[serde(default)]
    pub icache: CacheConfig,
    /// Data cache.
    #[serde(default)]
    pub dcache: CacheConfig,
}

/// Configuration for a single cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false every access goes to main memory uncached.
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,

    /// Ways per set.
    #[serde(default)]
    pub associativity: Associativity,

    /// Words per line.
    #[serde(default = "CacheConfig::default_line_words")]
    pub line_words: usize,

    /// Number of sets.
    #[serde(default = "CacheConfig::default_sets")]
    pub sets: usize,

    /// Victim selection for two-way caches.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_line_words() -> usize {
        defaults::LINE_WORDS
    }

    const fn default_sets() -> usize {
        defaults::SETS
    }

    /// Line size in bytes.
    pub const fn line_bytes(&self) -> usize {
        self.line_words * WORD_BYTES as usize
    }

    /// Total data capacity in bytes.
    pub const fn size_bytes(&self) -> usize {
        self.line_bytes() * self.sets * self.associativity.ways()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.line_words.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "cache.line_words",
                value: self.line_words,
            });
        }
        if !self.sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "cache.sets",
                value: self.sets,
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            associativity: Associativity::default(),
            line_words: defaults::LINE_WORDS,
            sets: defaults::SETS,
            policy: ReplacementPolicy::default(),
        }
    }
}
