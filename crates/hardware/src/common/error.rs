//! Error definitions.
//!
//! Two layers are used:
//! 1. **`MemError`:** Raised by caches and main memory. Components do not know which
//!    instruction or cycle caused an access, so these carry only the address.
//! 2. **`SimError`:** Raised by the pipeline; memory errors are wrapped with the
//!    offending instruction's PC and the cycle number before they leave a stage.
//!
//! Unsupported instructions are not errors; they execute as no-ops.

use thiserror::Error;

use crate::soc::memory::Port;

/// Errors reported by caches and main memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemError {
    /// Address not aligned to the access granularity.
    #[error("misaligned access at {addr:#010x} (requires {align}-byte alignment)")]
    Misaligned {
        /// Offending byte address.
        addr: u32,
        /// Required alignment in bytes.
        align: u32,
    },

    /// Address outside main memory and not a known MMIO register.
    #[error("address {addr:#010x} is outside the memory map")]
    OutOfRange {
        /// Offending byte address.
        addr: u32,
    },

    /// A request arrived while a previous one was still outstanding.
    #[error("request on {port:?} port while a transaction is outstanding")]
    Busy {
        /// Port the rejected request came from.
        port: Port,
    },

    /// Main memory answered with a response kind the requester did not ask for.
    #[error("unexpected response kind from main memory")]
    UnexpectedResponse,
}

/// Fatal simulation errors. Every variant stops the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Load, store or fetch address not aligned to its width.
    #[error("misaligned access at {addr:#010x} by instruction at pc={pc:#010x} (cycle {cycle})")]
    MisalignedAccess {
        /// Offending byte address.
        addr: u32,
        /// PC of the instruction that made the access.
        pc: u32,
        /// Cycle in which the access was attempted.
        cycle: u64,
    },

    /// Address outside the backing store and the MMIO registers.
    #[error("address {addr:#010x} out of range, instruction at pc={pc:#010x} (cycle {cycle})")]
    MemoryOutOfRange {
        /// Offending byte address.
        addr: u32,
        /// PC of the instruction that made the access.
        pc: u32,
        /// Cycle in which the access was attempted.
        cycle: u64,
    },

    /// Internal invariant violation: a second request while one is outstanding.
    #[error("cache protocol violation at pc={pc:#010x} (cycle {cycle}): {source}")]
    CacheProtocolViolation {
        /// PC of the instruction whose request was rejected.
        pc: u32,
        /// Cycle in which the request was issued.
        cycle: u64,
        /// Underlying component error.
        source: MemError,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Memory image could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl SimError {
    /// Attaches pipeline context to a component error.
    ///
    /// # Arguments
    ///
    /// * `err` - The error returned by a cache or main memory.
    /// * `pc` - PC of the instruction responsible for the access.
    /// * `cycle` - Current cycle number.
    pub fn from_mem(err: MemError, pc: u32, cycle: u64) -> Self {
        match err {
            MemError::Misaligned { addr, .. } => Self::MisalignedAccess { addr, pc, cycle },
            MemError::OutOfRange { addr } => Self::MemoryOutOfRange { addr, pc, cycle },
            source @ (MemError::Busy { .. } | MemError::UnexpectedResponse) => {
                Self::CacheProtocolViolation { pc, cycle, source }
            }
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A geometry parameter must be a non-zero power of two.
    #[error("{field} must be a non-zero power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending field.
        field: &'static str,
        /// Supplied value.
        value: usize,
    },

    /// Main memory size is unusable.
    #[error("memory size {size:#x} must be a non-zero multiple of the {line_bytes}-byte line and end at or below {limit:#010x}")]
    MemorySize {
        /// Configured size in bytes.
        size: usize,
        /// Largest configured line size in bytes.
        line_bytes: usize,
        /// Upper limit imposed by the MMIO window.
        limit: u32,
    },

    /// JSON could not be parsed into a configuration.
    #[error("invalid configuration JSON: {0}")]
    Parse(String),
}

/// Errors raised while building or loading a memory image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("could not read '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The ELF file is malformed.
    #[error("invalid ELF image: {0}")]
    Elf(String),

    /// A token in a hex image is not a valid 32-bit word.
    #[error("invalid hex image at line {line}: '{token}'")]
    Hex {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// A segment does not fit into main memory.
    #[error("segment at {addr:#010x} with {len} bytes does not fit in {size:#x} bytes of memory")]
    SegmentOutOfRange {
        /// Segment base address.
        addr: u32,
        /// Segment length in bytes.
        len: usize,
        /// Memory size in bytes.
        size: usize,
    },
}

impl Clone for LoadError {
    fn clone(&self) -> Self {
        match self {
            Self::Io { path, source } => Self::Io {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::Elf(msg) => Self::Elf(msg.clone()),
            Self::Hex { line, token } => Self::Hex {
                line: *line,
                token: token.clone(),
            },
            Self::SegmentOutOfRange { addr, len, size } => Self::SegmentOutOfRange {
                addr: *addr,
                len: *len,
                size: *size,
            },
        }
    }
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for LoadError {}
