//! Instruction encoding and decoding for the ChipVM instruction set.
//!
//! Every instruction is exactly 12 bytes, encoded little-endian:
//! ```text
//! Bytes 0-3:  opcode discriminant (u32)
//! Bytes 4-7:  left (i32)
//! Bytes 8-11: right (i32)
//! ```

use std::fmt;

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// Size of one encoded instruction record in bytes.
pub const RECORD_SIZE: usize = 12;

/// A single ChipVM instruction.
///
/// The meaning of `left` and `right` depends on the opcode: an immediate,
/// a variable offset, a jump target index, a byte count or a syscall selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// First operand.
    pub left: i32,
    /// Second operand.
    pub right: i32,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, left: i32, right: i32) -> Self {
        Self {
            opcode,
            left,
            right,
        }
    }

    /// Encode this instruction to 12 bytes (little-endian).
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..4].copy_from_slice(&(self.opcode as u32).to_le_bytes());
        bytes[4..8].copy_from_slice(&self.left.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.right.to_le_bytes());
        bytes
    }

    /// Decode 12 bytes into an instruction (little-endian).
    pub fn decode(bytes: [u8; RECORD_SIZE]) -> Result<Self, DecodeError> {
        let opcode = Opcode::try_from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))?;
        let left = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let right = i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

        Ok(Self {
            opcode,
            left,
            right,
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.opcode.mnemonic(), self.left, self.right)
    }
}
