//! Write-back, write-allocate cache with an explicit request state machine.
//!
//! A cache serves one word-granular request at a time. Each request moves through
//! [`CacheState`]:
//!
//! ```text
//! Ready --request--> Lookup --hit--------------------------------> Ready
//!                       |--miss, clean victim--> Fill --line-----> Ready
//!                       |--miss, dirty victim--> Writeback --ack--> Fill
//!                       `--MMIO / disabled-----> Fill --word/ack--> Ready
//! ```
//!
//! `tick` performs exactly one transition per cycle, so tests can single-step the
//! machine. Lines are stored one array per way. MMIO addresses are never
//! allocated; they pass through to main memory as uncached word requests.

/// Cache replacement policy implementations (LRU, FIFO).
pub mod policies;

use serde::Serialize;
use tracing::debug;

use self::policies::ReplacementPolicy;
use crate::common::constants::WORD_BYTES;
use crate::common::error::MemError;
use crate::config::CacheConfig;
use crate::soc::memory::{MainMemory, MemRequest, MemResponse, Port, merge_word};
use crate::soc::memory_map::{Region, classify};

/// Validity of a cache line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum LineStatus {
    /// Holds no data.
    #[default]
    NotValid,
    /// Matches main memory.
    Clean,
    /// Modified since it was filled; must be written back on eviction.
    Dirty,
}

/// One cache line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Address tag.
    pub tag: u32,
    /// Validity and dirtiness.
    pub status: LineStatus,
    /// Line contents, `line_words` words.
    pub data: Vec<u32>,
}

impl CacheLine {
    fn empty(words: usize) -> Self {
        Self {
            data: vec![0; words],
            ..Self::default()
        }
    }

    /// True unless the line is `NotValid`.
    pub fn is_valid(&self) -> bool {
        self.status != LineStatus::NotValid
    }
}

/// Request state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum CacheState {
    /// Idle; accepts a new request.
    #[default]
    Ready,
    /// Tag check pending (or retrying while main memory is busy).
    Lookup,
    /// Dirty victim being written back.
    Writeback,
    /// Waiting for a line fill or an uncached word access.
    Fill,
}

/// Word operation requested from the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOp {
    /// Read the word.
    Read,
    /// Write the lanes of `data` selected by `byte_enable`.
    Write {
        /// Word with the stored bytes in their lanes.
        data: u32,
        /// One bit per byte lane.
        byte_enable: u8,
    },
}

/// A word-aligned request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheRequest {
    /// Word-aligned byte address.
    pub addr: u32,
    /// Operation.
    pub op: CacheOp,
}

impl CacheRequest {
    /// Read of the word at `addr`.
    pub const fn read(addr: u32) -> Self {
        Self {
            addr,
            op: CacheOp::Read,
        }
    }

    /// Write of the lanes of `data` selected by `byte_enable` at `addr`.
    pub const fn write(addr: u32, data: u32, byte_enable: u8) -> Self {
        Self {
            addr,
            op: CacheOp::Write { data, byte_enable },
        }
    }
}

/// Data returned for a completed read. Writes complete without a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheResponse {
    /// Address that was read.
    pub addr: u32,
    /// Word read.
    pub data: u32,
}

/// How the most recent request was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AccessOutcome {
    /// Found in the cache.
    Hit,
    /// Required a line fill.
    Miss,
    /// Bypassed the cache (MMIO or disabled cache).
    Uncached,
}

/// Per-cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests served from a resident line.
    pub hits: u64,
    /// Requests that needed a line fill.
    pub misses: u64,
    /// Dirty lines written back on eviction.
    pub writebacks: u64,
    /// Requests passed through uncached.
    pub uncached: u64,
}

impl CacheStats {
    /// Hits over cached accesses, 0 when nothing was cached.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    req: CacheRequest,
    way: usize,
}

/// Set-associative write-back cache.
#[derive(Debug)]
pub struct Cache {
    port: Port,
    enabled: bool,
    line_words: usize,
    sets: usize,
    ways: Vec<Vec<CacheLine>>,
    policy: Box<dyn ReplacementPolicy>,
    state: CacheState,
    pending: Option<Pending>,
    response: Option<CacheResponse>,
    last_outcome: Option<AccessOutcome>,
    stats: CacheStats,
}

impl Cache {
    /// Creates an empty cache attached to `port` of main memory.
    pub fn new(config: &CacheConfig, port: Port) -> Self {
        let ways = config.associativity.ways();
        let sets = config.sets.max(1);
        let line_words = config.line_words.max(1);
        Self {
            port,
            enabled: config.enabled,
            line_words,
            sets,
            ways: (0..ways)
                .map(|_| vec![CacheLine::empty(line_words); sets])
                .collect(),
            policy: policies::from_config(config.policy, sets, ways),
            state: CacheState::Ready,
            pending: None,
            response: None,
            last_outcome: None,
            stats: CacheStats::default(),
        }
    }

    /// Current state of the request machine.
    pub const fn state(&self) -> CacheState {
        self.state
    }

    /// True when a new request would be accepted.
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, CacheState::Ready) && self.response.is_none()
    }

    /// True while a request is being served.
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Accepts a request.
    ///
    /// # Errors
    ///
    /// * `Busy` if a request is in progress or a response is unclaimed.
    /// * `Misaligned` if `addr` is not word-aligned.
    pub fn request(&mut self, req: CacheRequest) -> Result<(), MemError> {
        if !self.is_ready() {
            return Err(MemError::Busy { port: self.port });
        }
        if req.addr % WORD_BYTES != 0 {
            return Err(MemError::Misaligned {
                addr: req.addr,
                align: WORD_BYTES,
            });
        }
        self.pending = Some(Pending { req, way: 0 });
        self.state = CacheState::Lookup;
        Ok(())
    }

    /// Claims the response to a completed read.
    pub const fn take_response(&mut self) -> Option<CacheResponse> {
        self.response.take()
    }

    /// True when a completed read awaits its consumer.
    pub const fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// How the most recent request was (or is being) served.
    pub const fn last_outcome(&self) -> Option<AccessOutcome> {
        self.last_outcome
    }

    /// Counters.
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of ways.
    pub fn ways(&self) -> usize {
        self.ways.len()
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Words per line.
    pub const fn line_words(&self) -> usize {
        self.line_words
    }

    const fn line_bytes(&self) -> u32 {
        self.line_words as u32 * WORD_BYTES
    }

    /// Splits a byte address into `(tag, set, word offset)`.
    pub const fn decompose(&self, addr: u32) -> (u32, usize, usize) {
        let line_bytes = self.line_bytes();
        let offset = ((addr / WORD_BYTES) as usize) % self.line_words;
        let set = ((addr / line_bytes) as usize) % self.sets;
        let tag = addr / (line_bytes * self.sets as u32);
        (tag, set, offset)
    }

    const fn line_base(&self, tag: u32, set: usize) -> u32 {
        let line_bytes = self.line_bytes();
        tag * (line_bytes * self.sets as u32) + set as u32 * line_bytes
    }

    /// Inspects a line.
    pub fn line(&self, way: usize, set: usize) -> Option<&CacheLine> {
        self.ways.get(way)?.get(set)
    }

    fn find_hit(&self, tag: u32, set: usize) -> Option<usize> {
        self.ways
            .iter()
            .position(|lines| lines.get(set).is_some_and(|l| l.is_valid() && l.tag == tag))
    }

    fn select_victim(&self, set: usize) -> usize {
        self.ways
            .iter()
            .position(|lines| lines.get(set).is_some_and(|l| !l.is_valid()))
            .unwrap_or_else(|| self.policy.get_victim(set))
    }

    /// Reads a resident word without side effects (debug views).
    pub fn peek_word(&self, addr: u32) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        let (tag, set, offset) = self.decompose(addr);
        let way = self.find_hit(tag, set)?;
        self.line(way, set)?.data.get(offset).copied()
    }

    /// Advances the request machine by one transition.
    ///
    /// # Errors
    ///
    /// Propagates main memory errors (range and alignment of line or word transfers)
    /// and `UnexpectedResponse` if main memory answers with the wrong kind.
    pub fn tick(&mut self, mem: &mut MainMemory) -> Result<(), MemError> {
        match self.state {
            CacheState::Ready => Ok(()),
            CacheState::Lookup => self.lookup(mem),
            CacheState::Writeback => self.writeback(mem),
            CacheState::Fill => self.fill(mem),
        }
    }

    fn lookup(&mut self, mem: &mut MainMemory) -> Result<(), MemError> {
        let Some(pending) = self.pending else {
            self.state = CacheState::Ready;
            return Ok(());
        };
        let addr = pending.req.addr;
        let cacheable = self.enabled && classify(addr, mem.size()) == Region::Dram;

        if !cacheable {
            if mem.is_busy() {
                return Ok(());
            }
            let request = match pending.req.op {
                CacheOp::Read => MemRequest::ReadWord { addr },
                CacheOp::Write { data, byte_enable } => MemRequest::WriteWord {
                    addr,
                    data,
                    byte_enable,
                },
            };
            mem.request(self.port, request)?;
            self.stats.uncached += 1;
            self.last_outcome = Some(AccessOutcome::Uncached);
            self.state = CacheState::Fill;
            return Ok(());
        }

        let (tag, set, offset) = self.decompose(addr);
        if let Some(way) = self.find_hit(tag, set) {
            self.stats.hits += 1;
            self.last_outcome = Some(AccessOutcome::Hit);
            self.policy.update(set, way);
            self.complete(pending.req, way, set, offset);
            return Ok(());
        }

        if mem.is_busy() {
            return Ok(());
        }

        let way = self.select_victim(set);
        let line_base = self.line_base(tag, set);
        let victim = self.ways.get(way).and_then(|lines| lines.get(set));
        let dirty = victim
            .filter(|line| line.status == LineStatus::Dirty)
            .map(|line| (self.line_base(line.tag, set), line.data.clone()));

        if let Some((victim_addr, data)) = dirty {
            debug!(port = ?self.port, "miss at {addr:#010x}, writing back dirty line {victim_addr:#010x}");
            mem.request(
                self.port,
                MemRequest::WriteLine {
                    addr: victim_addr,
                    data,
                },
            )?;
            self.stats.writebacks += 1;
            self.state = CacheState::Writeback;
        } else {
            debug!(port = ?self.port, "miss at {addr:#010x}, filling line {line_base:#010x}");
            mem.request(
                self.port,
                MemRequest::ReadLine {
                    addr: line_base,
                    words: self.line_words,
                },
            )?;
            self.state = CacheState::Fill;
        }

        self.stats.misses += 1;
        self.last_outcome = Some(AccessOutcome::Miss);
        self.pending = Some(Pending { way, ..pending });
        Ok(())
    }

    fn writeback(&mut self, mem: &mut MainMemory) -> Result<(), MemError> {
        let Some(response) = mem.take_response(self.port) else {
            return Ok(());
        };
        if response != MemResponse::Ack {
            return Err(MemError::UnexpectedResponse);
        }
        let Some(pending) = self.pending else {
            self.state = CacheState::Ready;
            return Ok(());
        };

        let (_, set, _) = self.decompose(pending.req.addr);
        if let Some(line) = self.ways.get_mut(pending.way).and_then(|l| l.get_mut(set)) {
            line.status = LineStatus::NotValid;
        }
        let addr = pending.req.addr & !(self.line_bytes() - 1);
        mem.request(
            self.port,
            MemRequest::ReadLine {
                addr,
                words: self.line_words,
            },
        )?;
        self.state = CacheState::Fill;
        Ok(())
    }

    fn fill(&mut self, mem: &mut MainMemory) -> Result<(), MemError> {
        let Some(response) = mem.take_response(self.port) else {
            return Ok(());
        };
        let Some(pending) = self.pending else {
            self.state = CacheState::Ready;
            return Ok(());
        };

        match response {
            MemResponse::Word(data) => {
                self.response = Some(CacheResponse {
                    addr: pending.req.addr,
                    data,
                });
                self.finish();
            }
            MemResponse::Ack => self.finish(),
            MemResponse::Line(data) => {
                if data.len() != self.line_words {
                    return Err(MemError::UnexpectedResponse);
                }
                let (tag, set, offset) = self.decompose(pending.req.addr);
                if let Some(line) = self.ways.get_mut(pending.way).and_then(|l| l.get_mut(set)) {
                    *line = CacheLine {
                        tag,
                        status: LineStatus::Clean,
                        data,
                    };
                }
                self.policy.fill(set, pending.way);
                self.complete(pending.req, pending.way, set, offset);
            }
        }
        Ok(())
    }

    /// Performs the request on a resident line and returns to `Ready`.
    fn complete(&mut self, req: CacheRequest, way: usize, set: usize, offset: usize) {
        if let Some(line) = self.ways.get_mut(way).and_then(|l| l.get_mut(set))
            && let Some(word) = line.data.get_mut(offset)
        {
            match req.op {
                CacheOp::Read => {
                    self.response = Some(CacheResponse {
                        addr: req.addr,
                        data: *word,
                    });
                }
                CacheOp::Write { data, byte_enable } => {
                    *word = merge_word(*word, data, byte_enable);
                    line.status = LineStatus::Dirty;
                }
            }
        }
        self.finish();
    }

    const fn finish(&mut self) {
        self.pending = None;
        self.state = CacheState::Ready;
    }

    /// Writes every dirty line back to main memory without timing and marks it clean.
    pub fn flush_dirty(&mut self, mem: &mut MainMemory) {
        let line_bytes = self.line_bytes();
        let sets = self.sets as u32;
        for lines in &mut self.ways {
            for (set, line) in lines.iter_mut().enumerate() {
                if line.status == LineStatus::Dirty {
                    let base = line.tag * (line_bytes * sets) + set as u32 * line_bytes;
                    mem.write_words(base, &line.data);
                    line.status = LineStatus::Clean;
                }
            }
        }
    }
}
