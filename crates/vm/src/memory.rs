//! Byte segments and address values.
//!
//! Both the operand stack and the variable store are fixed-capacity byte
//! buffers holding raw little-endian bit patterns. All access goes through
//! checked accessors that return `None` instead of reading out of range.

/// Width of an integer or float word on the operand stack.
pub const WORD: usize = 4;

/// Width of an address value on the operand stack.
pub const ADDRESS: usize = 8;

/// A zero-initialized, fixed-capacity byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    bytes: Box<[u8]>,
}

impl Segment {
    /// Allocate a zeroed segment of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    /// Capacity in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-capacity segment.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.bytes.get(offset..offset.checked_add(len)?)
    }

    /// Read `N` bytes starting at `offset`.
    pub fn read<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Some(out)
    }

    /// Overwrite bytes starting at `offset`. Nothing is written on failure.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Option<()> {
        let end = offset.checked_add(data.len())?;
        self.bytes.get_mut(offset..end)?.copy_from_slice(data);
        Some(())
    }

    /// Zero the whole segment.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

/// A tagged address: an offset into the variable store of one call frame.
///
/// On the operand stack it occupies 8 bytes: `offset` then `frame`, both
/// little-endian `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    /// Byte offset into the frame's variable store.
    pub offset: u32,
    /// Id of the frame owning the variable store.
    pub frame: u32,
}

impl Address {
    pub fn to_bytes(self) -> [u8; ADDRESS] {
        let mut bytes = [0u8; ADDRESS];
        bytes[..4].copy_from_slice(&self.offset.to_le_bytes());
        bytes[4..].copy_from_slice(&self.frame.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; ADDRESS]) -> Self {
        Self {
            offset: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            frame: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}
