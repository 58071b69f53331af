//! Decode errors for ChipVM byte streams.

use thiserror::Error;

/// Errors that occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Opcode discriminant outside the known set.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),

    /// Record area length is not a multiple of 12.
    #[error("invalid byte stream length: {0} (must be multiple of 12 after the preamble)")]
    InvalidLength(usize),
}
