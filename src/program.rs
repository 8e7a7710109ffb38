/*
 * unquad: translate goto-based quadruples back to structured Python code.
 * Copyright (C) 2021  Ruifeng Xie
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Quadruple programs, and the line-oriented reader for them.
//!
//! Reading is best-effort: a line that does not parse is dropped (and recorded as a
//! [`SkippedLine`]), the remaining lines are still read.

use std::fmt::{Display, Formatter, Write};
use std::str::FromStr;
use displaydoc::Display as DisplayDoc;
use parse_display::FromStr;
use thiserror::Error;

use crate::instr::{Instr, Opcode};

/// Parse error for a single line.
#[derive(Debug, DisplayDoc, Error, Clone, Eq, PartialEq)]
pub enum ParseError {
    /// missing instruction index, expected `<index>: <OPCODE> ...`
    MissingIndex,
    /// missing opcode
    MissingOpcode,
    /// unknown opcode: {0}
    UnknownOpcode(String),
    /// malformed `{opcode}` instruction: expected `{opcode} {shape}`, found `{found}`
    Malformed {
        /// The opcode of the offending instruction.
        opcode: Opcode,
        /// The expected operand shape.
        shape: &'static str,
        /// The operands actually found.
        found: String,
    },
}

/// One line of quadruple code: `<index>: <instr>`, or a label definition without index.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct SourceLine {
    /// The index written in front of the instruction, if any.
    pub index: Option<usize>,
    /// The instruction itself.
    pub instr: Instr,
}

/// `<index>: <instr>`, the instruction still unparsed.
#[derive(FromStr)]
#[from_str(regex = r"\s*(?P<index>[0-9]+)\s*:(?P<instr>.*)")]
struct NumberedLine {
    index: usize,
    instr: String,
}

/// Labels are not numbered.
#[derive(FromStr)]
#[from_str(regex = r"\s*(?P<instr>LABEL\s.*)")]
struct LabelLine {
    instr: String,
}

impl FromStr for SourceLine {
    type Err = ParseError;
    fn from_str(line: &str) -> Result<SourceLine, ParseError> {
        if let Ok(NumberedLine { index, instr }) = line.parse() {
            return Ok(SourceLine { index: Some(index), instr: instr.parse()? });
        }
        let LabelLine { instr } = line.parse().map_err(|_| ParseError::MissingIndex)?;
        Ok(SourceLine { index: None, instr: instr.parse()? })
    }
}

impl Display for SourceLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(k) => write!(f, "{}: {}", k, self.instr),
            None => write!(f, "{}", self.instr),
        }
    }
}

/// A program is a series of [`Instr`]uctions, addressed by position.
pub type Program = [Instr];

/// A line dropped by [`read_program`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SkippedLine {
    /// Line number in the input, starting from 1.
    pub line_no: usize,
    /// The line, with surrounding whitespace removed.
    pub text: String,
    /// Why the line was dropped.
    pub error: ParseError,
}

impl Display for SkippedLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {} (`{}`)", self.line_no, self.error, self.text)
    }
}

/// Result of [`read_program`]: the program, and the lines which did not make it.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Successfully parsed instructions.
    pub program: Box<Program>,
    /// Non-blank lines which failed to parse.
    pub skipped: Vec<SkippedLine>,
}

/// Parse one line. Blank lines produce `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Instr>, ParseError> {
    if line.trim().is_empty() { return Ok(None); }
    line.parse::<SourceLine>().map(|line| Some(line.instr))
}

/// Read lines of quadruple code into a [`Program`].
pub fn read_program<I, S>(lines: I) -> Listing
    where I: IntoIterator<Item=S>, S: AsRef<str> {
    let mut program = Vec::new();
    let mut skipped = Vec::new();
    for (line, line_no) in lines.into_iter().zip(1..) {
        let line = line.as_ref();
        match parse_line(line) {
            Ok(Some(instr)) => program.push(instr),
            Ok(None) => {}
            Err(error) => {
                log::debug!("skipping line {}: {}", line_no, error);
                skipped.push(SkippedLine { line_no, text: line.trim().to_string(), error });
            }
        }
    }
    Listing { program: program.into_boxed_slice(), skipped }
}

/// Print the [`Program`] as source text, in canonical form.
pub fn display_program(program: &Program) -> Result<String, std::fmt::Error> {
    let mut result = String::new();
    for (k, instr) in program.iter().enumerate() {
        match instr {
            Instr::Label(_) => writeln!(result, "{}", instr)?,
            _ => writeln!(result, "{}: {}", k, instr)?,
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use itertools::assert_equal;
    use crate::samples;
    use crate::instr::Instr;
    use super::{display_program, parse_line, read_program, ParseError, SourceLine};

    #[test]
    fn test_source_line() {
        let line: SourceLine = "  3: ADD    t0 = a + 1".parse().unwrap();
        assert_eq!(line.index, Some(3));
        assert_eq!(line.to_string(), "3: ADD t0 = a + 1");
        let line: SourceLine = "LABEL L0:".parse().unwrap();
        assert_eq!(line.index, None);
        assert_eq!(line.instr, Instr::Label("L0".to_string()));
        let line: SourceLine = "12: LABEL  L_WHILE_END1:".parse().unwrap();
        assert_eq!(line.instr, Instr::Label("L_WHILE_END1".to_string()));
        assert_eq!("ADD t0 = a + 1".parse::<SourceLine>(), Err(ParseError::MissingIndex));
        assert_eq!("x: GOTO L0".parse::<SourceLine>(), Err(ParseError::MissingIndex));
        assert_eq!("LABELL0:".parse::<SourceLine>(), Err(ParseError::MissingIndex));
        assert_eq!("7 : GOTO L0".parse::<SourceLine>().unwrap().index, Some(7));
        assert_eq!("7: JUMP L0".parse::<SourceLine>(), Err(ParseError::UnknownOpcode("JUMP".to_string())));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line(""), Ok(None));
        assert!(parse_line("0: ASSIGN x = 5").unwrap().is_some());
        assert!(parse_line("0: ASSIGN x").is_err());
        assert!(parse_line("garbage").is_err());
    }

    #[test]
    fn test_program() {
        fn test_roundtrip(source: &str) {
            let listing = read_program(source.lines());
            assert!(listing.skipped.is_empty());
            let printed = display_program(&listing.program).unwrap();
            assert_equal(source.lines().filter(|l| !l.is_empty()), printed.lines());
        }

        test_roundtrip(indoc::indoc! {r#"
            0: ASSIGN i = 0
            1: ASSIGN s = 0
            LABEL L0:
            3: IF_GEQ i >= 10 GOTO L1
            4: ADD s = s + i
            5: ADD i = i + 1
            6: GOTO L0
            LABEL L1:
            8: PRINT "s = %d", s
        "#});
    }

    #[test]
    fn test_skipped_lines() {
        let listing = read_program(samples::GARBLED.lines());
        assert_eq!(listing.program.len(), 9);
        assert_eq!(listing.skipped.len(), 1);
        let skipped = &listing.skipped[0];
        assert_eq!(skipped.line_no, 5);
        assert_eq!(skipped.text, "4: MUL d = a *");
        assert!(skipped.to_string().starts_with("line 5: malformed `MUL` instruction"));
    }
}
