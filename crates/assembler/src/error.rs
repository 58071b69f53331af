//! Error types for the ChipVM assembler.

use thiserror::Error;

/// Errors produced during assembly of text to binary.
///
/// Every variant is fatal: assembly stops at the first error and no
/// program is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An indented line holds no opcode token.
    #[error("line {line}: operation code undefined")]
    MissingOpcode { line: usize },

    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// A branch or call was written without its target label.
    #[error("line {line}: {opcode} requires a label operand")]
    MissingLabel { line: usize, opcode: &'static str },

    /// A branch or call names a label that is never declared.
    #[error("line {line}: unable to find label '{label}'")]
    UnknownLabel { line: usize, label: String },

    /// The same label is declared twice.
    #[error("line {line}: label '{label}' already declared on line {first_line}")]
    DuplicateLabel {
        line: usize,
        label: String,
        first_line: usize,
    },

    /// An unindented line is not of the form `name:`.
    #[error("line {line}: invalid label declaration '{text}'")]
    InvalidLabel { line: usize, text: String },

    /// A numeric operand could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// More operands than an instruction can hold.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// The source contains a NUL character.
    #[error("line {line}: source contains NUL character(s)")]
    NulCharacter { line: usize },
}
