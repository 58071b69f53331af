//! Opcode definitions for the ChipVM instruction set.
//!
//! Operand stack values are 4-byte little-endian words (two's complement
//! integers or IEEE-754 `f32` bit patterns), except address values produced
//! by `LDA`, which occupy 8 bytes. Binary operators pop `pop1` (the top of
//! the stack) and then `pop2`, and push `pop1 <op> pop2`.

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u32)]` attribute fixes the 4-byte discriminant written to
/// the binary format.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack & memory
    /// Push `left` as a 4-byte word.
    Push = 0,
    /// Push the word at variable offset `left`.
    LoadI = 1,
    /// Pop a word into variable offset `left`.
    StoreI = 2,
    /// Copy the word at variable offset `left` onto the stack, advance by 1 byte.
    LoadC = 3,
    /// Retreat by 1 byte, copy the word there into variable offset `left`.
    StoreC = 4,
    /// Push the 8-byte address of variable offset `left` in the current frame.
    Lda = 5,
    /// Pop an address, push the word it points at.
    Deref = 6,
    /// Pop an address, pop a word, store the word through the address.
    Sta = 7,

    // Conversion
    /// Pop a float, push it truncated toward zero as an integer.
    Cf2i32 = 8,
    /// Pop an integer, push it widened to a float.
    Ci2f32 = 9,

    // Arithmetic
    /// Integer addition.
    Add = 10,
    /// Float addition.
    AddF = 11,
    /// Integer subtraction (`pop1 - pop2`).
    Sub = 12,
    /// Float subtraction (`pop1 - pop2`).
    SubF = 13,
    /// Integer multiplication.
    Mul = 14,
    /// Float multiplication.
    MulF = 15,
    /// Integer division (`pop1 / pop2`). A zero divisor is a runtime fault.
    Div = 16,
    /// Float division (`pop1 / pop2`).
    DivF = 17,
    /// Integer remainder (`pop1 % pop2`). A zero divisor is a runtime fault.
    Mod = 18,
    /// Shift left (`pop1 << pop2`).
    Shl = 19,
    /// Arithmetic shift right (`pop1 >> pop2`).
    Shr = 20,
    /// Bitwise AND.
    And = 21,

    // Comparison
    /// Push 1 if `pop1 < pop2` (integers), else 0.
    CmpLt = 22,
    /// Push 1 if `pop1 < pop2` (floats), else 0.
    CmpLtF = 23,
    /// Push 1 if `pop1 > pop2` (integers), else 0.
    CmpGt = 24,
    /// Push 1 if `pop1 > pop2` (floats), else 0.
    CmpGtF = 25,
    /// Push 1 if the two words differ, else 0.
    Neq = 26,

    // Control flow
    /// Pop two words; jump to `left` if they are equal.
    Je = 27,
    /// Jump to `left`.
    Jmp = 28,
    /// Call `left`, moving the top `right` bytes into the callee's variables.
    Call = 29,
    /// Invoke host service `left`.
    Syscall = 30,
    /// Return `left` bytes to the caller, or end the program at top level.
    Ret = 31,
}

/// All valid opcodes, in discriminant order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 32] = [
    Opcode::Push,
    Opcode::LoadI,
    Opcode::StoreI,
    Opcode::LoadC,
    Opcode::StoreC,
    Opcode::Lda,
    Opcode::Deref,
    Opcode::Sta,
    Opcode::Cf2i32,
    Opcode::Ci2f32,
    Opcode::Add,
    Opcode::AddF,
    Opcode::Sub,
    Opcode::SubF,
    Opcode::Mul,
    Opcode::MulF,
    Opcode::Div,
    Opcode::DivF,
    Opcode::Mod,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::And,
    Opcode::CmpLt,
    Opcode::CmpLtF,
    Opcode::CmpGt,
    Opcode::CmpGtF,
    Opcode::Neq,
    Opcode::Je,
    Opcode::Jmp,
    Opcode::Call,
    Opcode::Syscall,
    Opcode::Ret,
];

impl TryFrom<u32> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ALL_OPCODES
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownOpcode(value))
    }
}

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Push => "pushi",
            Opcode::LoadI => "loadi",
            Opcode::StoreI => "storei",
            Opcode::LoadC => "loadc",
            Opcode::StoreC => "storec",
            Opcode::Lda => "lda",
            Opcode::Deref => "deref",
            Opcode::Sta => "sta",
            Opcode::Cf2i32 => "cf2i32",
            Opcode::Ci2f32 => "ci2f32",
            Opcode::Add => "add",
            Opcode::AddF => "addf",
            Opcode::Sub => "sub",
            Opcode::SubF => "subf",
            Opcode::Mul => "mul",
            Opcode::MulF => "mulf",
            Opcode::Div => "div",
            Opcode::DivF => "divf",
            Opcode::Mod => "mod",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::And => "and",
            Opcode::CmpLt => "cmplt",
            Opcode::CmpLtF => "cmpltf",
            Opcode::CmpGt => "cmpgt",
            Opcode::CmpGtF => "cmpgtf",
            Opcode::Neq => "neq",
            Opcode::Je => "je",
            Opcode::Jmp => "jmp",
            Opcode::Call => "call",
            Opcode::Syscall => "syscall",
            Opcode::Ret => "ret",
        }
    }

    /// Look up an opcode by its exact (case-sensitive) mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic() == mnemonic)
            .copied()
    }

    /// True for opcodes whose `left` operand is an instruction index
    /// written as a label in assembly text.
    pub fn takes_label(&self) -> bool {
        matches!(self, Opcode::Je | Opcode::Jmp | Opcode::Call)
    }
}
