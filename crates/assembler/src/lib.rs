//! ChipVM assembler: two-pass text → binary translation.
//!
//! The first pass records every label at the index of the instruction that
//! follows it, so branches and calls may refer to labels declared later in
//! the file. The second pass resolves mnemonics and operands.
//!
//! # Usage
//!
//! ```
//! use chipvm_assembler::{assemble, disassemble};
//!
//! let text = "main:\n\tpushi 2\n\tpushi 3\n\tadd\n\tsyscall 0\n\tret\n";
//! let program = assemble(text).unwrap();
//! assert_eq!(program.len(), 5);
//! assert_eq!(assemble(&disassemble(&program)).unwrap(), program);
//! ```
//!
//! # Source format
//!
//! ```text
//! main:              ; a label: no leading tab, trailing ':'
//! 	pushi 7        ; an instruction: leading tab, mnemonic, up to two operands
//! 	call square 4  ; call/je/jmp take a label as the first operand
//! 	ret
//! ```

pub mod error;
pub mod labels;

mod disassembler;
mod lexer;
mod parser;

pub use error::AsmError;
pub use labels::Label;

use chipvm_common::Program;
use labels::collect_labels;
use lexer::{classify_line, Line};
use parser::parse_instruction;

/// Assemble text into a program.
///
/// Returns the first error encountered; no partial program is produced.
pub fn assemble(text: &str) -> Result<Program, AsmError> {
    let lines = classify(text)?;
    let labels = collect_labels(&lines)?;

    let mut instructions = Vec::new();
    for (line_num, line) in &lines {
        if let Line::Instruction { mnemonic, operands } = line {
            instructions.push(parse_instruction(mnemonic, operands, &labels, *line_num)?);
        }
    }

    Ok(Program::new(instructions))
}

/// Run only the label pass and return the labels in declaration order.
pub fn resolve_labels(text: &str) -> Result<Vec<Label>, AsmError> {
    let lines = classify(text)?;
    Ok(collect_labels(&lines)?.into_labels())
}

/// Disassemble a program into assembly text with synthesized labels.
pub fn disassemble(program: &Program) -> String {
    disassembler::disassemble(program)
}

fn classify(text: &str) -> Result<Vec<(usize, Line<'_>)>, AsmError> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| classify_line(line, idx + 1).map(|class| (idx + 1, class)))
        .collect()
}
