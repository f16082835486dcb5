//! Program Image Loading.
//!
//! This module turns files on disk into a [`MemoryImage`]: a list of byte segments plus
//! an optional entry point. It supports:
//! 1. **Flat binaries:** Raw bytes placed at address 0.
//! 2. **Hex images:** One 32-bit little-endian word per token, with `@addr` directives
//!    (word addresses) and `//` or `#` comments.
//! 3. **ELF32:** `PT_LOAD` segments and the entry point, parsed with `object`. Bytes past
//!    the file size of a segment are zero.

use std::fs;
use std::path::Path;

use object::elf::{EM_RISCV, FileHeader32, PT_LOAD};
use object::read::elf::{FileHeader, ProgramHeader};
use object::Endianness;
use tracing::debug;

use crate::common::constants::{MMIO_WINDOW_BASE, WORD_BYTES};
use crate::common::error::LoadError;

/// ELF magic number.
const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Contiguous bytes to place in main memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segment {
    /// Byte address of the first byte.
    pub addr: u32,
    /// Segment contents.
    pub data: Vec<u8>,
}

impl Segment {
    /// One past the last byte address covered by the segment.
    pub const fn end(&self) -> usize {
        self.addr as usize + self.data.len()
    }
}

/// A loadable program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryImage {
    /// Segments in file order.
    pub segments: Vec<Segment>,
    /// First PC, if the format carries one.
    pub entry: Option<u32>,
}

/// Supported on-disk formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFormat {
    /// Pick ELF by magic number and hex by file extension, otherwise binary.
    #[default]
    Auto,
    /// Raw bytes loaded at address 0.
    Binary,
    /// Whitespace separated hex words.
    Hex,
    /// ELF32 executable.
    Elf,
}

impl ImageFormat {
    /// Resolves `Auto` from the file name and its leading bytes.
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        if bytes.starts_with(ELF_MAGIC) {
            return Self::Elf;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("hex" | "mem" | "txt") => Self::Hex,
            _ => Self::Binary,
        }
    }
}

impl MemoryImage {
    /// Builds an image from raw bytes loaded at address 0.
    pub fn from_binary(bytes: &[u8]) -> Self {
        Self {
            segments: vec![Segment {
                addr: 0,
                data: bytes.to_vec(),
            }],
            entry: None,
        }
    }

    /// Builds an image from 32-bit words placed consecutively from address 0.
    pub fn from_words(words: &[u32]) -> Self {
        Self {
            segments: vec![Segment {
                addr: 0,
                data: words.iter().flat_map(|w| w.to_le_bytes()).collect(),
            }],
            entry: None,
        }
    }

    /// Parses a hex word image.
    ///
    /// # Examples
    ///
    /// ```
    /// use rv32sim_core::sim::loader::MemoryImage;
    ///
    /// let image = MemoryImage::from_hex("00a00513 // li a0, 10\n@10\n0000006f").unwrap();
    /// assert_eq!(image.segments.len(), 2);
    /// assert_eq!(image.segments[1].addr, 0x40);
    /// ```
    ///
    /// # Errors
    ///
    /// `LoadError::Hex` for a token that is not a 32-bit hex number.
    pub fn from_hex(text: &str) -> Result<Self, LoadError> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut current = Segment::default();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line
                .split("//")
                .next()
                .and_then(|l| l.split('#').next())
                .unwrap_or_default();
            for token in line.split_whitespace() {
                let bad = || LoadError::Hex {
                    line: idx + 1,
                    token: token.to_string(),
                };
                if let Some(addr) = token.strip_prefix('@') {
                    let word_addr = parse_hex(addr).ok_or_else(bad)?;
                    if !current.data.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    current.addr = word_addr.wrapping_mul(WORD_BYTES);
                } else {
                    let word = parse_hex(token).ok_or_else(bad)?;
                    current.data.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        if !current.data.is_empty() {
            segments.push(current);
        }
        Ok(Self {
            segments,
            entry: None,
        })
    }

    /// Parses an ELF32 RISC-V executable.
    ///
    /// # Errors
    ///
    /// `LoadError::Elf` if the file is not a little-endian ELF32 RISC-V image, a
    /// program header points outside the file, or a segment's memory size is smaller
    /// than its file size or reaches past the DRAM window at `MMIO_WINDOW_BASE`.
    pub fn from_elf(bytes: &[u8]) -> Result<Self, LoadError> {
        let header = FileHeader32::<Endianness>::parse(bytes).map_err(|e| LoadError::Elf(e.to_string()))?;
        let endian = header.endian().map_err(|e| LoadError::Elf(e.to_string()))?;
        let machine = header.e_machine(endian);
        if machine != EM_RISCV {
            return Err(LoadError::Elf(format!(
                "not a RISC-V executable (machine {machine:#x})"
            )));
        }

        let mut segments = Vec::new();
        for phdr in header
            .program_headers(endian, bytes)
            .map_err(|e| LoadError::Elf(e.to_string()))?
        {
            if phdr.p_type(endian) != PT_LOAD {
                continue;
            }
            let addr = phdr.p_vaddr(endian);
            let file_size = phdr.p_filesz(endian);
            let mem_size = phdr.p_memsz(endian);
            if mem_size < file_size {
                return Err(LoadError::Elf(format!(
                    "segment at {addr:#010x} has memsz {mem_size:#x} below filesz {file_size:#x}"
                )));
            }
            if u64::from(addr) + u64::from(mem_size) > u64::from(MMIO_WINDOW_BASE) {
                return Err(LoadError::Elf(format!(
                    "segment at {addr:#010x} with {mem_size:#x} bytes overlaps the MMIO window"
                )));
            }
            let mut data = phdr
                .data(endian, bytes)
                .map_err(|_| LoadError::Elf(format!("segment at {addr:#010x} is truncated")))?
                .to_vec();
            data.resize(mem_size as usize, 0);
            debug!("elf segment {:#010x} ({} bytes)", addr, data.len());
            segments.push(Segment { addr, data });
        }

        Ok(Self {
            segments,
            entry: Some(header.e_entry(endian)),
        })
    }

    /// Reads and parses an image file.
    ///
    /// # Errors
    ///
    /// `LoadError::Io` if the file cannot be read, otherwise any parse error of the
    /// selected format.
    pub fn from_file(path: &Path, format: ImageFormat) -> Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let format = match format {
            ImageFormat::Auto => ImageFormat::detect(path, &bytes),
            other => other,
        };
        debug!("loading {} as {:?}", path.display(), format);
        match format {
            ImageFormat::Elf => Self::from_elf(&bytes),
            ImageFormat::Hex => {
                let text = String::from_utf8_lossy(&bytes);
                Self::from_hex(&text)
            }
            ImageFormat::Auto | ImageFormat::Binary => Ok(Self::from_binary(&bytes)),
        }
    }

    /// Total number of bytes across all segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.data.len()).sum()
    }

    /// True when the image has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_hex(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
