//! Disassembler: binary program → assembly text.
//!
//! Branch and call targets are given synthesized `L<index>:` labels. Zero
//! operands are omitted from the end of an instruction line.

use std::collections::BTreeSet;

use chipvm_common::Program;

/// Disassemble a program into assembly text.
///
/// The output reassembles to an identical program as long as every branch
/// and call target lies within `0..=program.len()`. Targets outside that
/// range are printed as bare numbers.
pub fn disassemble(program: &Program) -> String {
    let instrs = &program.instructions;
    let targets: BTreeSet<usize> = instrs
        .iter()
        .filter(|instr| instr.opcode.takes_label())
        .filter_map(|instr| usize::try_from(instr.left).ok())
        .filter(|&target| target <= instrs.len())
        .collect();

    let mut out = String::new();
    for index in 0..=instrs.len() {
        if targets.contains(&index) {
            out.push_str(&format!("L{index}:\n"));
        }
        let Some(instr) = instrs.get(index) else {
            break;
        };

        let left = match usize::try_from(instr.left) {
            Ok(target) if instr.opcode.takes_label() && targets.contains(&target) => {
                format!("L{target}")
            }
            _ => instr.left.to_string(),
        };

        let line = if instr.right != 0 {
            format!("\t{} {} {}", instr.opcode.mnemonic(), left, instr.right)
        } else if instr.left != 0 || instr.opcode.takes_label() {
            format!("\t{} {}", instr.opcode.mnemonic(), left)
        } else {
            format!("\t{}", instr.opcode.mnemonic())
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
