//! Integration tests for the ChipVM assembler.
//!
//! Tests cover:
//! - Assembling the sample programs and executing them
//! - Roundtrip properties (assemble → disassemble → assemble)
//! - Error cases (unknown opcode, unknown label, invalid number, etc.)
//! - Label resolution across the whole file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chipvm_assembler::{assemble, disassemble, resolve_labels, AsmError};
use chipvm_common::{Instruction, Opcode, Program, ALL_OPCODES};
use chipvm_vm::{run_with, Host};
use proptest::prelude::*;

// ---- Test helpers ----

/// Host collecting printed values as text.
#[derive(Default)]
struct Output(Vec<String>);

impl Host for Output {
    fn print_int(&mut self, value: i32) -> io::Result<()> {
        self.0.push(value.to_string());
        Ok(())
    }

    fn print_float(&mut self, value: f32) -> io::Result<()> {
        self.0.push(format!("{value:.6}"));
        Ok(())
    }

    fn sleep(&mut self, _seconds: u32) -> io::Result<()> {
        Ok(())
    }
}

fn sample(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/programs")
        .join(name)
}

/// Assemble and run text, returning everything printed.
fn execute(text: &str) -> Vec<String> {
    let program = assemble(text).unwrap();
    let mut out = Output::default();
    run_with(&program, &mut out).unwrap();
    out.0
}

fn ins(opcode: Opcode, left: i32, right: i32) -> Instruction {
    Instruction::new(opcode, left, right)
}

// ---- Sample programs ----

#[test]
fn sample_add() {
    let text = fs::read_to_string(sample("add.S")).unwrap();
    assert_eq!(execute(&text), vec!["5"]);
}

#[test]
fn sample_factorial() {
    let text = fs::read_to_string(sample("factorial.S")).unwrap();
    assert_eq!(execute(&text), vec!["720"]);
}

#[test]
fn sample_countdown() {
    let text = fs::read_to_string(sample("countdown.S")).unwrap();
    assert_eq!(execute(&text), vec!["5", "4", "3", "2", "1"]);
}

#[test]
fn sample_pointer() {
    let text = fs::read_to_string(sample("pointer.S")).unwrap();
    assert_eq!(execute(&text), vec!["21", "42"]);
}

#[test]
fn sample_floats() {
    let text = fs::read_to_string(sample("floats.S")).unwrap();
    assert_eq!(execute(&text), vec!["7.750000", "7"]);
}

#[test]
fn samples_roundtrip_through_disassembly() {
    for name in ["add.S", "factorial.S", "countdown.S", "pointer.S", "floats.S"] {
        let text = fs::read_to_string(sample(name)).unwrap();
        let program = assemble(&text).unwrap();
        let again = assemble(&disassemble(&program)).unwrap();
        assert_eq!(again, program, "{name}");
    }
}

// ---- Label resolution ----

#[test]
fn forward_and_backward_labels() {
    let text = "\
start:
\tjmp end
middle:
\tjmp start
end:
\tcall middle 4
";
    let program = assemble(text).unwrap();
    assert_eq!(
        program.instructions,
        vec![
            ins(Opcode::Jmp, 2, 0),
            ins(Opcode::Jmp, 0, 0),
            ins(Opcode::Call, 1, 4),
        ]
    );
}

#[test]
fn comments_and_blank_lines_do_not_shift_labels() {
    let text = "\
; header comment

main:
\tpushi 1   ; one
\t; indented comment only

\tje target
target:
\tret
";
    let program = assemble(text).unwrap();
    assert_eq!(program.len(), 3);
    assert_eq!(program.instructions[1], ins(Opcode::Je, 2, 0));
}

#[test]
fn resolve_labels_reports_indices() {
    let labels = resolve_labels("a:\n\tret\nb:\nc:\n\tret\n").unwrap();
    let found: Vec<(&str, u32)> = labels.iter().map(|l| (l.name.as_str(), l.index)).collect();
    assert_eq!(found, vec![("a", 0), ("b", 1), ("c", 1)]);
}

#[test]
fn label_at_end_of_file_points_past_last_instruction() {
    let program = assemble("\tjmp end\nend:\n").unwrap();
    assert_eq!(program.instructions, vec![ins(Opcode::Jmp, 1, 0)]);
}

// ---- Error cases ----

#[test]
fn unknown_label_is_error() {
    assert_eq!(
        assemble("\tpushi 1\n\tjmp nowhere\n"),
        Err(AsmError::UnknownLabel {
            line: 2,
            label: "nowhere".to_string()
        })
    );
}

#[test]
fn unknown_opcode_is_error() {
    assert_eq!(
        assemble("main:\n\tpush 1\n"),
        Err(AsmError::UnknownOpcode {
            line: 2,
            token: "push".to_string()
        })
    );
}

#[test]
fn mnemonics_are_case_sensitive() {
    assert!(matches!(
        assemble("\tPUSHI 1\n"),
        Err(AsmError::UnknownOpcode { line: 1, .. })
    ));
}

#[test]
fn missing_label_operand() {
    assert_eq!(
        assemble("\tcall\n"),
        Err(AsmError::MissingLabel {
            line: 1,
            opcode: "call"
        })
    );
}

#[test]
fn duplicate_label() {
    assert_eq!(
        assemble("x:\n\tret\nx:\n\tret\n"),
        Err(AsmError::DuplicateLabel {
            line: 3,
            label: "x".to_string(),
            first_line: 1
        })
    );
}

#[test]
fn unindented_instruction_is_invalid_label() {
    assert_eq!(
        assemble("pushi 1\n"),
        Err(AsmError::InvalidLabel {
            line: 1,
            text: "pushi 1".to_string()
        })
    );
}

#[test]
fn bad_operands() {
    assert_eq!(
        assemble("\tpushi 12abc\n"),
        Err(AsmError::InvalidNumber {
            line: 1,
            token: "12abc".to_string()
        })
    );
    assert_eq!(
        assemble("\tpushi 1 2 3\n"),
        Err(AsmError::UnexpectedToken {
            line: 1,
            token: "3".to_string()
        })
    );
}

#[test]
fn nul_character_rejected() {
    assert_eq!(
        assemble("\tpushi 1\n\tret\0\n"),
        Err(AsmError::NulCharacter { line: 2 })
    );
}

#[test]
fn first_error_wins() {
    // Label errors are found in the first pass, before any opcode errors.
    assert!(matches!(
        assemble("\tbogus\nx:\nx:\n"),
        Err(AsmError::DuplicateLabel { .. })
    ));
}

// ---- Encoding ----

#[test]
fn assembled_program_encodes_to_records() {
    let program = assemble("\tpushi -1 0x10\n\tret 4\n").unwrap();
    let bytes = program.encode();
    assert_eq!(bytes.len(), 8 + 2 * 12);
    assert_eq!(&bytes[8..20], &[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0x10, 0, 0, 0]);
    assert_eq!(Program::decode(&bytes).unwrap(), program);
}

#[test]
fn every_opcode_survives_disassembly() {
    let instructions: Vec<Instruction> = ALL_OPCODES
        .iter()
        .map(|&op| {
            if op.takes_label() {
                ins(op, 0, 8)
            } else {
                ins(op, 4, -2)
            }
        })
        .collect();
    let program = Program::new(instructions);
    assert_eq!(assemble(&disassemble(&program)).unwrap(), program);
}

// ---- Properties ----

fn any_instruction(len: i32) -> impl Strategy<Value = Instruction> {
    (0..ALL_OPCODES.len(), any::<i32>(), any::<i32>(), 0..=len).prop_map(
        move |(idx, left, right, target)| {
            let op = ALL_OPCODES[idx];
            if op.takes_label() {
                Instruction::new(op, target, right)
            } else {
                Instruction::new(op, left, right)
            }
        },
    )
}

fn any_program() -> impl Strategy<Value = Program> {
    (1i32..40).prop_flat_map(|len| {
        prop::collection::vec(any_instruction(len), len as usize).prop_map(Program::new)
    })
}

proptest! {
    #[test]
    fn disassembly_reassembles(program in any_program()) {
        let text = disassemble(&program);
        prop_assert_eq!(assemble(&text).unwrap(), program);
    }
}
