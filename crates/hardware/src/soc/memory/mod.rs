//! Main memory.
//!
//! This module implements the memory behind the caches. It provides:
//! 1. **Buffer:** Byte-addressable, little-endian backing store (`DramBuffer`).
//! 2. **Transactions:** One outstanding request at a time, shared by the instruction and
//!    data ports. `tick` counts the latency down, performs the access and parks the
//!    response until the owning port claims it.
//! 3. **Controller:** Latency modeling (burst cost, optional DRAM row buffer).
//! 4. **MMIO:** Word requests to device registers are forwarded to [`Mmio`].
//! 5. **Debug Access:** Untimed reads and writes for the loader and state dumps.

/// DRAM backing store.
pub mod buffer;

/// Memory controller implementations for access latency modeling.
pub mod controller;

use serde::Serialize;
use tracing::trace;

use self::buffer::DramBuffer;
use self::controller::MemoryController;
use crate::common::constants::WORD_BYTES;
use crate::common::error::MemError;
use crate::config::MemoryConfig;
use crate::soc::devices::Mmio;
use crate::soc::memory_map::{Region, classify};

/// Requester identity on the shared memory port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Port {
    /// Instruction cache.
    Instruction,
    /// Data cache.
    Data,
}

/// Transaction kinds accepted by main memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemRequest {
    /// Read `words` words of a line starting at the line-aligned `addr`.
    ReadLine {
        /// Line base address.
        addr: u32,
        /// Words per line.
        words: usize,
    },
    /// Write a whole line back.
    WriteLine {
        /// Line base address.
        addr: u32,
        /// Line contents.
        data: Vec<u32>,
    },
    /// Uncached single-word read (MMIO, or DRAM behind a disabled cache).
    ReadWord {
        /// Word-aligned address.
        addr: u32,
    },
    /// Uncached single-word write; only bytes selected by `byte_enable` change.
    WriteWord {
        /// Word-aligned address.
        addr: u32,
        /// Word with the stored bytes in their lanes.
        data: u32,
        /// One bit per byte lane, bit 0 = lowest address.
        byte_enable: u8,
    },
}

impl MemRequest {
    /// Target address of the request.
    pub const fn addr(&self) -> u32 {
        match self {
            Self::ReadLine { addr, .. }
            | Self::WriteLine { addr, .. }
            | Self::ReadWord { addr }
            | Self::WriteWord { addr, .. } => *addr,
        }
    }
}

/// Completed transaction results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemResponse {
    /// Line contents for `ReadLine`.
    Line(Vec<u32>),
    /// Word for `ReadWord`.
    Word(u32),
    /// Completion of a write.
    Ack,
}

#[derive(Debug)]
struct Transaction {
    port: Port,
    request: MemRequest,
    remaining: u64,
}

/// Full-word byte-enable mask.
pub const FULL_WORD: u8 = 0b1111;

/// Merges the lanes of `new` selected by `byte_enable` into `old`.
pub const fn merge_word(old: u32, new: u32, byte_enable: u8) -> u32 {
    let mut mask = 0u32;
    let mut lane = 0;
    while lane < 4 {
        if byte_enable & (1 << lane) != 0 {
            mask |= 0xFF << (lane * 8);
        }
        lane += 1;
    }
    (old & !mask) | (new & mask)
}

/// Extracts the enabled lanes of `data` shifted down to bit 0.
///
/// A byte store to the console register therefore yields the byte itself,
/// whichever lane it travelled in.
pub const fn lane_value(data: u32, byte_enable: u8) -> u32 {
    if byte_enable == 0 {
        return 0;
    }
    let shift = byte_enable.trailing_zeros() * 8;
    let width = byte_enable.count_ones() * 8;
    let value = data >> shift;
    if width >= 32 {
        value
    } else {
        value & ((1 << width) - 1)
    }
}

/// Byte-addressable main memory with one outstanding transaction.
pub struct MainMemory {
    dram: DramBuffer,
    controller: Box<dyn MemoryController>,
    mmio: Mmio,
    mmio_latency: u64,
    in_flight: Option<Transaction>,
    response: Option<(Port, MemResponse)>,
}

impl std::fmt::Debug for MainMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainMemory")
            .field("size", &self.dram.len())
            .field("in_flight", &self.in_flight)
            .field("response", &self.response)
            .field("mmio", &self.mmio)
            .finish_non_exhaustive()
    }
}

impl MainMemory {
    /// Creates main memory from its configuration and the device block.
    pub fn new(config: &MemoryConfig, mmio: Mmio) -> Self {
        Self {
            dram: DramBuffer::new(config.size_bytes),
            controller: controller::from_config(config),
            mmio,
            mmio_latency: config.mmio_latency.max(1),
            in_flight: None,
            response: None,
        }
    }

    /// DRAM size in bytes.
    pub fn size(&self) -> usize {
        self.dram.len()
    }

    /// True while a transaction is in flight or its response is unclaimed.
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.response.is_some()
    }

    /// Port that owns the current transaction, if any.
    pub fn owner(&self) -> Option<Port> {
        self.in_flight
            .as_ref()
            .map(|t| t.port)
            .or_else(|| self.response.as_ref().map(|(port, _)| *port))
    }

    /// Starts a transaction for `port`.
    ///
    /// # Errors
    ///
    /// * `Busy` when another transaction is outstanding.
    /// * `Misaligned` when a line request is not line-aligned or a word request is not
    ///   word-aligned.
    /// * `OutOfRange` when the access leaves DRAM or targets an unmapped address.
    pub fn request(&mut self, port: Port, request: MemRequest) -> Result<(), MemError> {
        if self.is_busy() {
            return Err(MemError::Busy { port });
        }

        let latency = match &request {
            MemRequest::ReadLine { addr, words } => self.line_latency(*addr, *words)?,
            MemRequest::WriteLine { addr, data } => self.line_latency(*addr, data.len())?,
            MemRequest::ReadWord { addr } | MemRequest::WriteWord { addr, .. } => {
                if addr % WORD_BYTES != 0 {
                    return Err(MemError::Misaligned {
                        addr: *addr,
                        align: WORD_BYTES,
                    });
                }
                match classify(*addr, self.size()) {
                    Region::Dram => self.controller.access_latency(*addr, 1),
                    Region::Mmio(_) => self.mmio_latency,
                    Region::Unmapped => return Err(MemError::OutOfRange { addr: *addr }),
                }
            }
        };

        trace!(?port, ?request, latency, "memory transaction started");
        self.in_flight = Some(Transaction {
            port,
            request,
            remaining: latency,
        });
        Ok(())
    }

    fn line_latency(&mut self, addr: u32, words: usize) -> Result<u64, MemError> {
        let bytes = words as u32 * WORD_BYTES;
        if bytes == 0 || addr % bytes != 0 {
            return Err(MemError::Misaligned { addr, align: bytes });
        }
        if addr as usize + bytes as usize > self.size() {
            return Err(MemError::OutOfRange { addr });
        }
        Ok(self.controller.access_latency(addr, words))
    }

    /// Advances the outstanding transaction by one cycle.
    pub fn tick(&mut self) {
        let Some(txn) = self.in_flight.as_mut() else {
            return;
        };
        txn.remaining = txn.remaining.saturating_sub(1);
        if txn.remaining > 0 {
            return;
        }
        if let Some(txn) = self.in_flight.take() {
            let response = self.perform(&txn.request);
            trace!(port = ?txn.port, "memory transaction completed");
            self.response = Some((txn.port, response));
        }
    }

    fn perform(&mut self, request: &MemRequest) -> MemResponse {
        match request {
            MemRequest::ReadLine { addr, words } => MemResponse::Line(self.read_words(*addr, *words)),
            MemRequest::WriteLine { addr, data } => {
                self.write_words(*addr, data);
                MemResponse::Ack
            }
            MemRequest::ReadWord { addr } => match classify(*addr, self.size()) {
                Region::Mmio(reg) => MemResponse::Word(self.mmio.read(reg)),
                Region::Dram | Region::Unmapped => {
                    MemResponse::Word(self.read_word(*addr).unwrap_or(0))
                }
            },
            MemRequest::WriteWord {
                addr,
                data,
                byte_enable,
            } => {
                match classify(*addr, self.size()) {
                    Region::Mmio(reg) => self.mmio.write(reg, lane_value(*data, *byte_enable)),
                    Region::Dram | Region::Unmapped => {
                        if let Some(old) = self.read_word(*addr) {
                            self.write_word(*addr, merge_word(old, *data, *byte_enable));
                        }
                    }
                }
                MemResponse::Ack
            }
        }
    }

    /// Claims the parked response if it belongs to `port`.
    pub fn take_response(&mut self, port: Port) -> Option<MemResponse> {
        match &self.response {
            Some((owner, _)) if *owner == port => self.response.take().map(|(_, resp)| resp),
            _ => None,
        }
    }

    /// Untimed word read from DRAM; `None` outside DRAM or when misaligned.
    pub fn read_word(&self, addr: u32) -> Option<u32> {
        if addr % WORD_BYTES != 0 {
            return None;
        }
        self.dram.read_u32(addr as usize)
    }

    /// Untimed word write to DRAM; ignored outside DRAM or when misaligned.
    pub fn write_word(&mut self, addr: u32, val: u32) {
        if addr % WORD_BYTES == 0 {
            let _ = self.dram.write_u32(addr as usize, val);
        }
    }

    /// Untimed read of `count` consecutive words; words outside DRAM read as 0.
    pub fn read_words(&self, addr: u32, count: usize) -> Vec<u32> {
        (0..count as u32)
            .map(|i| self.read_word(addr.wrapping_add(i * WORD_BYTES)).unwrap_or(0))
            .collect()
    }

    /// Untimed write of consecutive words.
    pub fn write_words(&mut self, addr: u32, data: &[u32]) {
        for (i, word) in data.iter().enumerate() {
            self.write_word(addr.wrapping_add(i as u32 * WORD_BYTES), *word);
        }
    }

    /// Copies raw bytes into DRAM (image loading).
    ///
    /// # Errors
    ///
    /// `OutOfRange` when the bytes do not fit.
    pub fn load_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemError> {
        self.dram
            .write_slice(addr as usize, bytes)
            .ok_or(MemError::OutOfRange { addr })
    }

    /// Reads raw bytes from DRAM.
    pub fn read_bytes(&self, addr: u32, len: usize) -> Option<&[u8]> {
        self.dram.read_slice(addr as usize, len)
    }

    /// The MMIO device block.
    pub const fn mmio(&self) -> &Mmio {
        &self.mmio
    }

    /// Mutable access to the MMIO device block.
    pub const fn mmio_mut(&mut self) -> &mut Mmio {
        &mut self.mmio
    }
}
