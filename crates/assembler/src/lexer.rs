//! Line classifier and operand tokenizer for ChipVM assembly text.
//!
//! A line starting with a tab is an instruction line; any other non-blank
//! line declares a label as `name:`. Comments start with `;` and extend to
//! end of line.

use crate::error::AsmError;

/// Classification of a single source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// Nothing to assemble: empty, whitespace or comment only.
    Blank,
    /// A label declaration, delimiter stripped.
    Label(&'a str),
    /// An instruction: mnemonic plus at most two operand tokens.
    Instruction {
        mnemonic: &'a str,
        operands: Vec<&'a str>,
    },
}

/// Classify one line of assembly text.
pub(crate) fn classify_line(line: &str, line_num: usize) -> Result<Line<'_>, AsmError> {
    if line.contains('\0') {
        return Err(AsmError::NulCharacter { line: line_num });
    }

    // Strip comment
    let (code, commented) = match line.find(';') {
        Some(pos) => (&line[..pos], true),
        None => (line, false),
    };

    if let Some(rest) = code.strip_prefix('\t') {
        if rest.is_empty() || (commented && rest.trim().is_empty()) {
            return Ok(Line::Blank);
        }
        let mut words = rest.split_whitespace();
        let mnemonic = words
            .next()
            .ok_or(AsmError::MissingOpcode { line: line_num })?;
        let operands: Vec<&str> = words.collect();
        if let Some(extra) = operands.get(2) {
            return Err(AsmError::UnexpectedToken {
                line: line_num,
                token: extra.to_string(),
            });
        }
        return Ok(Line::Instruction { mnemonic, operands });
    }

    let text = code.trim();
    if text.is_empty() {
        return Ok(Line::Blank);
    }
    match text.strip_suffix(':') {
        Some(name) if !name.is_empty() && !name.contains(char::is_whitespace) => {
            Ok(Line::Label(name))
        }
        _ => Err(AsmError::InvalidLabel {
            line: line_num,
            text: text.to_string(),
        }),
    }
}

/// Parse a numeric operand into a 32-bit word.
///
/// Accepts decimal (`-12`), hex (`0x1f`, `-0x1f`, up to 32 bits of pattern)
/// and float literals containing a `.` (`3.7`), which are stored as their
/// IEEE-754 single-precision bit pattern.
pub(crate) fn parse_operand(token: &str, line_num: usize) -> Result<i32, AsmError> {
    let invalid = || AsmError::InvalidNumber {
        line: line_num,
        token: token.to_string(),
    };

    if let Ok(value) = token.parse::<i32>() {
        return Ok(value);
    }

    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        // from_str_radix would accept a sign here.
        if !hex.starts_with(|c: char| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let magnitude = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return if negative {
            i32::try_from(-(magnitude as i64)).map_err(|_| invalid())
        } else {
            Ok(magnitude as i32)
        };
    }

    if token.contains('.') {
        let value: f32 = token.parse().map_err(|_| invalid())?;
        return Ok(value.to_bits() as i32);
    }

    Err(invalid())
}
