//! DRAM backing store.
//!
//! A zero-initialised, little-endian byte array. Accessors return `None` when
//! the range does not fit instead of panicking.

/// Backing storage for main memory.
#[derive(Clone)]
pub struct DramBuffer {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for DramBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DramBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl DramBuffer {
    /// Allocates `size` zeroed bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-sized buffer.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn read_slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.bytes.get(offset..offset.checked_add(len)?)
    }

    /// Writes `data` starting at `offset`.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) -> Option<()> {
        let end = offset.checked_add(data.len())?;
        self.bytes.get_mut(offset..end)?.copy_from_slice(data);
        Some(())
    }

    /// Reads a little-endian word.
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.read_slice(offset, 4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Writes a little-endian word.
    pub fn write_u32(&mut self, offset: usize, val: u32) -> Option<()> {
        self.write_slice(offset, &val.to_le_bytes())
    }
}
