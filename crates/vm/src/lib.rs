//! ChipVM virtual machine: executes encoded instruction streams.
//!
//! The VM is a stack machine with a call-frame-structured memory model:
//! - An operand stack of raw little-endian words
//! - A variable store addressed by byte offset
//! - A call stack; every CALL swaps in a fresh operand stack and variable
//!   store, and the matching RET restores the caller's
//!
//! All memory access is bounds-checked. Faults halt the program with a
//! [`RuntimeError`].
//!
//! # Usage
//!
//! ```
//! use chipvm_common::{Instruction, Opcode, Program};
//! use chipvm_vm::{run_with, StdHost};
//!
//! let program = Program::new(vec![
//!     Instruction::new(Opcode::Push, 2, 0),
//!     Instruction::new(Opcode::Push, 3, 0),
//!     Instruction::new(Opcode::Add, 0, 0),
//!     Instruction::new(Opcode::Syscall, 0, 0),
//!     Instruction::new(Opcode::Ret, 0, 0),
//! ]);
//!
//! let mut host = StdHost::with_writer(Vec::new());
//! run_with(&program, &mut host).unwrap();
//! assert_eq!(host.into_inner(), b"5\n");
//! ```

pub mod error;
pub mod execute;
pub mod host;
pub mod machine;
pub mod memory;

pub use error::RuntimeError;
pub use host::{Host, StdHost};
pub use machine::{Limits, State, VM};

use chipvm_common::{Image, Program};

/// Execute a program, printing to stdout.
pub fn run(program: &Program) -> Result<(), RuntimeError> {
    run_with(program, StdHost::new())
}

/// Execute a program against the given host.
pub fn run_with<H: Host>(program: &Program, host: H) -> Result<(), RuntimeError> {
    let bytes = program.encode();
    run_bytes(&bytes, host)
}

/// Execute an encoded stream (with or without preamble) against the given host.
///
/// Records are decoded as they are fetched, so an unknown opcode only
/// faults if execution reaches it.
pub fn run_bytes<H: Host>(bytes: &[u8], host: H) -> Result<(), RuntimeError> {
    let image = Image::parse(bytes)?;
    VM::new(image, host).execute()
}
