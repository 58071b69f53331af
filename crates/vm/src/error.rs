//! Runtime faults for the ChipVM.
//!
//! Every fault halts the whole program; there is no in-VM recovery.
//! Variants carry the index of the instruction that raised them (`at`).

use chipvm_common::DecodeError;
use thiserror::Error;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The fetched record holds an opcode discriminant outside the known set.
    #[error("unknown op code {opcode} at instruction {at}")]
    UnknownOpcode { at: usize, opcode: u32 },

    /// SYSCALL with an unassigned selector.
    #[error("unknown syscall code {selector} at instruction {at}")]
    UnknownSyscall { at: usize, selector: i32 },

    /// The instruction pointer left the program without a top-level RET.
    #[error("unexpected end of program at instruction {at}")]
    UnexpectedEndOfProgram { at: usize },

    /// Pop below the bottom of the operand stack.
    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// Push past the capacity of the operand stack.
    #[error("stack overflow at instruction {at}")]
    StackOverflow { at: usize },

    /// Variable store access outside the segment.
    #[error("variable offset {offset} out of bounds (size {size}) at instruction {at}")]
    OutOfBounds { at: usize, offset: i64, size: usize },

    /// Address into a frame that has already returned.
    #[error("dangling address into frame {frame} at instruction {at}")]
    DanglingAddress { at: usize, frame: u32 },

    /// Integer DIV or MOD with a zero divisor.
    #[error("division by zero at instruction {at}")]
    DivideByZero { at: usize },

    /// CALL nested deeper than the configured limit.
    #[error("call depth exceeded limit {limit} at instruction {at}")]
    CallDepthExceeded { at: usize, limit: usize },

    /// Every 32-bit frame id has been handed out.
    #[error("frame ids exhausted at instruction {at}")]
    FrameIdsExhausted { at: usize },

    /// The syscall host failed to perform its side effect.
    #[error("syscall failed at instruction {at}: {message}")]
    Host { at: usize, message: String },

    /// The byte stream is not a whole number of records.
    #[error("invalid image: {0}")]
    InvalidImage(#[from] DecodeError),
}
