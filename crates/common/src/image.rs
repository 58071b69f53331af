//! Fetch view over an encoded instruction stream.
//!
//! The virtual machine executes directly from encoded records: an [`Image`]
//! only checks that the record area has a whole number of records, and an
//! opcode discriminant is validated when the record at that index is fetched.

use crate::error::DecodeError;
use crate::instruction::{Instruction, RECORD_SIZE};
use crate::program::MAGIC;

/// A borrowed, preamble-stripped array of 12-byte instruction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image<'a> {
    records: &'a [u8],
}

impl<'a> Image<'a> {
    /// Wrap an encoded stream, skipping the `CHIPCODE` preamble if present.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let records = bytes.strip_prefix(&MAGIC[..]).unwrap_or(bytes);
        if records.len() % RECORD_SIZE != 0 {
            return Err(DecodeError::InvalidLength(records.len()));
        }
        Ok(Self { records })
    }

    /// Number of instruction records.
    pub fn len(&self) -> usize {
        self.records.len() / RECORD_SIZE
    }

    /// Returns true if the image holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode the record at instruction index `index`.
    ///
    /// Returns `None` past the end of the image.
    pub fn fetch(&self, index: usize) -> Option<Result<Instruction, DecodeError>> {
        let start = index.checked_mul(RECORD_SIZE)?;
        let record = self.records.get(start..start.checked_add(RECORD_SIZE)?)?;
        let mut bytes = [0u8; RECORD_SIZE];
        bytes.copy_from_slice(record);
        Some(Instruction::decode(bytes))
    }
}
