//! ChipVM common types and instruction encoding.
//!
//! This crate provides the foundational data structures shared by the
//! assembler and the virtual machine:
//!
//! - [`Opcode`]: the closed set of 32 operation codes
//! - [`Instruction`]: an opcode with two signed 32-bit operands
//! - [`Program`]: an ordered instruction sequence with whole-stream encode/decode
//! - [`Image`]: a fetch view over encoded records, decoded one at a time
//! - [`DecodeError`]: errors from decoding byte streams
//!
//! # Binary format
//!
//! An optional 8-byte `CHIPCODE` preamble followed by fixed 12-byte records:
//! opcode discriminant, `left`, `right`, each a little-endian 32-bit word.
//! The instruction count is implied by the stream length.

pub mod error;
pub mod image;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use image::Image;
pub use instruction::{Instruction, RECORD_SIZE};
pub use opcode::{Opcode, ALL_OPCODES};
pub use program::{Program, MAGIC};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy that generates a random valid Opcode.
    fn arb_opcode() -> impl Strategy<Value = Opcode> {
        prop::sample::select(ALL_OPCODES.to_vec())
    }

    /// Strategy that generates a random valid Instruction.
    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        (arb_opcode(), any::<i32>(), any::<i32>())
            .prop_map(|(op, left, right)| Instruction::new(op, left, right))
    }

    proptest! {
        /// For all valid instructions, encode then decode produces the original.
        #[test]
        fn encode_decode_roundtrip(instr in arb_instruction()) {
            let bytes = instr.encode();
            let decoded = Instruction::decode(bytes).unwrap();
            prop_assert_eq!(instr, decoded);
        }

        /// For any 12 random bytes, decode either succeeds (and re-encodes
        /// identically) or reports the unknown discriminant.
        #[test]
        fn random_bytes_decode(bytes in prop::array::uniform12(any::<u8>())) {
            match Instruction::decode(bytes) {
                Ok(instr) => prop_assert_eq!(instr.encode(), bytes),
                Err(e) => {
                    let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    prop_assert_eq!(e, DecodeError::UnknownOpcode(raw));
                }
            }
        }

        /// Program encode/decode roundtrip, with and without the preamble.
        #[test]
        fn program_roundtrip(
            instrs in prop::collection::vec(arb_instruction(), 0..50)
        ) {
            let program = Program::new(instrs);
            prop_assert_eq!(Program::decode(&program.encode()).unwrap(), program.clone());
            prop_assert_eq!(Program::decode(&program.encode_raw()).unwrap(), program);
        }
    }
}
