//! Program representation for ChipVM instruction streams.
//!
//! A program is a sequence of instructions whose position is its address.
//! Binary files carry an optional 8-byte `CHIPCODE` preamble followed by
//! raw 12-byte records with no length prefix.

use crate::error::DecodeError;
use crate::image::Image;
use crate::instruction::{Instruction, RECORD_SIZE};

/// Format-version preamble written ahead of the records.
pub const MAGIC: [u8; 8] = *b"CHIPCODE";

/// A ChipVM program: a sequence of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Create a new program from a vector of instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Encode the program with the `CHIPCODE` preamble.
    ///
    /// The result length is always `8 + instructions.len() * 12`.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MAGIC.len() + self.instructions.len() * RECORD_SIZE);
        bytes.extend_from_slice(&MAGIC);
        self.write_records(&mut bytes);
        bytes
    }

    /// Encode the program as bare records, without the preamble.
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.instructions.len() * RECORD_SIZE);
        self.write_records(&mut bytes);
        bytes
    }

    fn write_records(&self, bytes: &mut Vec<u8>) {
        for instr in &self.instructions {
            bytes.extend_from_slice(&instr.encode());
        }
    }

    /// Decode a byte slice into a program, validating every record.
    ///
    /// The preamble is optional. The record area length must be a
    /// multiple of 12.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let image = Image::parse(bytes)?;
        let instructions = (0..image.len())
            .filter_map(|index| image.fetch(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { instructions })
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
