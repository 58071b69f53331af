//! Label pass: map label names to the index of the instruction that follows.

use std::collections::HashMap;

use crate::error::AsmError;
use crate::lexer::Line;

/// A resolved label: a name bound to an instruction index.
///
/// Labels do not occupy an instruction slot. A label declared after the
/// last instruction resolves to the program length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// The declared name, without the `:` delimiter.
    pub name: String,
    /// Index of the next instruction in program order.
    pub index: u32,
}

/// Label table built by the first pass and consulted by the second.
///
/// Scoped to a single assembly run.
#[derive(Debug, Default)]
pub(crate) struct LabelTable {
    labels: Vec<Label>,
    by_name: HashMap<String, (usize, usize)>,
}

impl LabelTable {
    /// Resolve a label name to its instruction index.
    pub(crate) fn resolve(&self, name: &str) -> Option<u32> {
        self.by_name
            .get(name)
            .map(|&(slot, _)| self.labels[slot].index)
    }

    /// The labels in declaration order.
    pub(crate) fn into_labels(self) -> Vec<Label> {
        self.labels
    }
}

/// Scan classified lines and record every label declaration.
///
/// Only instruction lines advance the index; label and blank lines do not.
pub(crate) fn collect_labels(lines: &[(usize, Line<'_>)]) -> Result<LabelTable, AsmError> {
    let mut table = LabelTable::default();
    let mut index: u32 = 0;

    for (line_num, line) in lines {
        match line {
            Line::Label(name) => {
                if let Some(&(_, first_line)) = table.by_name.get(*name) {
                    return Err(AsmError::DuplicateLabel {
                        line: *line_num,
                        label: name.to_string(),
                        first_line,
                    });
                }
                table
                    .by_name
                    .insert(name.to_string(), (table.labels.len(), *line_num));
                table.labels.push(Label {
                    name: name.to_string(),
                    index,
                });
            }
            Line::Instruction { .. } => index += 1,
            Line::Blank => {}
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(mnemonic: &'static str) -> Line<'static> {
        Line::Instruction {
            mnemonic,
            operands: vec![],
        }
    }

    #[test]
    fn labels_point_at_next_instruction() {
        let lines = vec![
            (1, Line::Label("main")),
            (2, ins("pushi")),
            (3, Line::Blank),
            (4, Line::Label("end")),
            (5, Line::Label("also_end")),
            (6, ins("ret")),
        ];
        let table = collect_labels(&lines).unwrap();
        assert_eq!(table.resolve("main"), Some(0));
        assert_eq!(table.resolve("end"), Some(1));
        assert_eq!(table.resolve("also_end"), Some(1));
        assert_eq!(table.resolve("missing"), None);
    }

    #[test]
    fn trailing_label_resolves_to_program_length() {
        let lines = vec![(1, ins("ret")), (2, Line::Label("after"))];
        let table = collect_labels(&lines).unwrap();
        assert_eq!(table.resolve("after"), Some(1));
    }

    #[test]
    fn duplicate_label_rejected() {
        let lines = vec![
            (1, Line::Label("main")),
            (2, ins("ret")),
            (3, Line::Label("main")),
        ];
        assert_eq!(
            collect_labels(&lines).unwrap_err(),
            AsmError::DuplicateLabel {
                line: 3,
                label: "main".to_string(),
                first_line: 1
            }
        );
    }

    #[test]
    fn declaration_order_preserved() {
        let lines = vec![(1, Line::Label("b")), (2, Line::Label("a"))];
        let names: Vec<_> = collect_labels(&lines)
            .unwrap()
            .into_labels()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, ["b", "a"]);
    }
}
