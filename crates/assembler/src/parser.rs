//! Instruction pass: classified lines → resolved instructions.

use crate::error::AsmError;
use crate::labels::LabelTable;
use crate::lexer::parse_operand;
use chipvm_common::{Instruction, Opcode};

/// Build one instruction from its mnemonic and operand tokens.
///
/// For `call`, `je` and `jmp` the first operand is a mandatory label name
/// resolved through `labels`. Every other operand is numeric and defaults
/// to 0 when absent.
pub(crate) fn parse_instruction(
    mnemonic: &str,
    operands: &[&str],
    labels: &LabelTable,
    line_num: usize,
) -> Result<Instruction, AsmError> {
    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownOpcode {
        line: line_num,
        token: mnemonic.to_string(),
    })?;

    let left = if opcode.takes_label() {
        let name = operands.first().ok_or(AsmError::MissingLabel {
            line: line_num,
            opcode: opcode.mnemonic(),
        })?;
        let index = labels.resolve(name).ok_or_else(|| AsmError::UnknownLabel {
            line: line_num,
            label: name.to_string(),
        })?;
        index as i32
    } else {
        optional_operand(operands, 0, line_num)?
    };
    let right = optional_operand(operands, 1, line_num)?;

    Ok(Instruction::new(opcode, left, right))
}

fn optional_operand(operands: &[&str], idx: usize, line_num: usize) -> Result<i32, AsmError> {
    operands
        .get(idx)
        .map_or(Ok(0), |token| parse_operand(token, line_num))
}
