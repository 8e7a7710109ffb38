/*
 * unquad: translate goto-based quadruples back to structured Python code.
 * Copyright (C) 2022  Ruifeng Xie
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

//! Reconstruction driver: turn a flat program into nested Python statements.
//!
//! The driver walks a range of the program. At each unvisited position it tries the structure
//! detectors; a detected structure consumes its labels and jumps, and the driver recurses into
//! each of its bodies. Anything else becomes a single statement. Jumps that do not fit any
//! structure degrade into comments instead of failing the translation.

use std::ops::Range;
use derivative::Derivative;

use crate::instr::{Instr, Operand};
use crate::label::LabelIndex;
use crate::program::{read_program, Program, SkippedLine};
use crate::python::{Module, Statement};
use crate::structure::{detect, Structure};

/// Translation options.
#[derive(Debug, Clone, Eq, PartialEq, Derivative)]
#[derivative(Default)]
pub struct Options {
    /// Comment on every label or jump left over by structure reconstruction.
    pub strict: bool,
    /// Surround the output with banner comments.
    #[derivative(Default(value = "true"))]
    pub banner: bool,
}

/// Result of [`translate_with`].
#[derive(Debug, Clone)]
pub struct Translation {
    /// The generated Python code, line by line.
    pub lines: Vec<String>,
    /// Input lines dropped because they did not parse.
    pub skipped: Vec<SkippedLine>,
}

/// The innermost loop being reconstructed: jumps to these labels are `continue` and `break`.
#[derive(Debug, Copy, Clone)]
struct LoopFrame<'a> {
    header: &'a str,
    exit: Option<&'a str>,
}

/// State of one translation run.
pub struct Translator<'a> {
    program: &'a Program,
    labels: LabelIndex,
    options: &'a Options,
    visited: Vec<bool>,
    params: Vec<Operand>,
    loops: Vec<LoopFrame<'a>>,
}

impl<'a> Translator<'a> {
    /// Prepare to translate this program.
    pub fn new(program: &'a Program, options: &'a Options) -> Translator<'a> {
        Translator {
            program,
            labels: LabelIndex::from_program(program),
            options,
            visited: vec![false; program.len()],
            params: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Reconstruct the whole program.
    pub fn run(mut self) -> Box<[Statement]> {
        let body = self.run_on(0..self.program.len());
        if !self.params.is_empty() {
            log::debug!("{} parameter(s) never consumed by a call", self.params.len());
        }
        body
    }

    fn run_on(&mut self, range: Range<usize>) -> Box<[Statement]> {
        let mut output = Vec::new();
        let mut k = range.start;
        while k < range.end {
            if self.visited[k] {
                k += 1;
                continue;
            }
            if let Some(structure) = detect(self.program, &self.labels, k, range.end) {
                let span = structure.span();
                for m in structure.markers() { self.visited[m] = true; }
                output.push(self.lift(structure));
                k = span.end.max(k + 1);
                continue;
            }
            self.visited[k] = true;
            self.handle_single(k, &mut output);
            k += 1;
        }
        output.into_boxed_slice()
    }

    fn lift(&mut self, structure: Structure) -> Statement {
        let program = self.program;
        let guard = match structure.guard(program) {
            Some(guard) => guard,
            None => return Statement::Comment(format!("malformed structure at {}", structure.branch())),
        };
        match structure {
            Structure::While(span) => {
                let (header, exit) = match (program[span.header].label(), program[span.exit].label()) {
                    (Some(header), Some(exit)) => (header, exit),
                    _ => return Statement::Comment(format!("malformed loop at {}", span.header)),
                };
                self.loops.push(LoopFrame { header, exit: Some(exit) });
                let head = self.run_on(span.head.clone());
                let mut body = self.run_on(span.body.clone()).into_vec();
                self.loops.pop();
                // without a back-edge, falling off the body reaches the exit label
                if span.back_edge.is_none() { body.push(Statement::Break); }
                if head.is_empty() {
                    return Statement::While { condition: Some(guard), loop_body: body.into_boxed_slice() };
                }
                let exit_test = Statement::If {
                    condition: guard.negate(),
                    then_branch: Box::new([Statement::Break]),
                    else_branch: None,
                };
                let loop_body = head.into_vec().into_iter()
                    .chain(std::iter::once(exit_test))
                    .chain(body)
                    .collect();
                Statement::While { condition: None, loop_body }
            }
            Structure::DoWhile(span) => {
                let header = match program[span.header].label() {
                    Some(header) => header,
                    None => return Statement::Comment(format!("malformed loop at {}", span.header)),
                };
                self.loops.push(LoopFrame { header, exit: None });
                let body = self.run_on(span.body.clone());
                self.loops.pop();
                let exit_test = Statement::If {
                    condition: guard,
                    then_branch: Box::new([Statement::Break]),
                    else_branch: None,
                };
                let loop_body = body.into_vec().into_iter().chain(std::iter::once(exit_test)).collect();
                Statement::While { condition: None, loop_body }
            }
            Structure::If(span) => {
                let then_branch = self.run_on(span.then_branch.clone());
                let else_branch = span.else_branch.clone().map(|range| self.run_on(range));
                Statement::If { condition: guard, then_branch, else_branch }
            }
        }
    }

    /// `break` or `continue`, if `label` is the exit or the header of the innermost loop.
    fn loop_jump(&self, label: &str) -> Option<Statement> {
        let frame = self.loops.last()?;
        if frame.header == label {
            Some(Statement::Continue)
        } else if frame.exit == Some(label) {
            Some(Statement::Break)
        } else {
            None
        }
    }

    fn handle_single(&mut self, k: usize, output: &mut Vec<Statement>) {
        let program = self.program;
        let instr = &program[k];
        let resolved = |label: &str| self.labels.resolve(label).is_some();
        match instr {
            Instr::Label(_) => if self.options.strict {
                output.push(Statement::Comment(format!("unconsumed label: {instr}")));
            }
            Instr::Goto(label) => {
                if let Some(statement) = self.loop_jump(label) {
                    output.push(statement);
                } else if !resolved(label) {
                    log::warn!("instruction {}: jump to undefined label {}", k, label);
                    output.push(Statement::Comment(format!("unresolved jump: {instr}")));
                } else if self.options.strict {
                    output.push(Statement::Comment(format!("unstructured jump: {instr}")));
                } else {
                    log::debug!("instruction {}: dropping unstructured jump to {}", k, label);
                }
            }
            Instr::Branch(br) => {
                if let Some(statement) = self.loop_jump(&br.dest) {
                    output.push(Statement::If {
                        condition: br.condition.clone(),
                        then_branch: Box::new([statement]),
                        else_branch: None,
                    });
                } else if !resolved(&br.dest) {
                    log::warn!("instruction {}: branch to undefined label {}", k, br.dest);
                    output.push(Statement::Comment(format!("unresolved jump: {instr}")));
                } else {
                    log::warn!("instruction {}: branch to {} matches no structure", k, br.dest);
                    output.push(Statement::Comment(format!("unstructured jump: {instr}")));
                }
            }
            Instr::Param(operand) => self.params.push(operand.clone()),
            Instr::Call { dest, callee, arg_count } => {
                if *arg_count > self.params.len() {
                    log::warn!("instruction {}: {} expects {} parameter(s), only {} pushed",
                               k, callee, arg_count, self.params.len());
                    output.push(Statement::Comment(format!("missing parameters: {instr}")));
                    return;
                }
                let args = (0..*arg_count).filter_map(|_| self.params.pop()).collect();
                output.push(Statement::call(dest.clone(), callee, args));
            }
            _ => output.extend(Statement::from_instr(instr)),
        }
    }
}

/// Translate quadruple code into Python, with the default [`Options`].
pub fn translate<I, S>(lines: I) -> Vec<String>
    where I: IntoIterator<Item=S>, S: AsRef<str> {
    translate_with(lines, &Options::default()).lines
}

/// Translate quadruple code into Python.
pub fn translate_with<I, S>(lines: I, options: &Options) -> Translation
    where I: IntoIterator<Item=S>, S: AsRef<str> {
    let listing = read_program(lines);
    let body = Translator::new(&listing.program, options).run();
    let module = Module { body, banner: options.banner };
    let lines = module.to_string().lines().map(str::to_string).collect();
    Translation { lines, skipped: listing.skipped }
}

#[cfg(test)]
mod tests {
    use itertools::assert_equal;
    use crate::samples;
    use super::{translate, translate_with, Options};

    /// Translate without the banners.
    fn body(source: &str) -> Vec<String> {
        translate_with(source.lines(), &Options { banner: false, ..Options::default() }).lines
    }

    fn strict(source: &str) -> Vec<String> {
        translate_with(source.lines(), &Options { strict: true, banner: false }).lines
    }

    #[test]
    fn test_options() {
        let options = Options::default();
        assert!(!options.strict);
        assert!(options.banner);
    }

    #[test]
    fn test_all_samples() {
        for input in samples::ALL_SAMPLES {
            let first = translate(input.lines());
            let second = translate(input.lines());
            assert_eq!(first, second);
            assert!(first.len() > 6);
            assert!(first.iter().all(|line| !line.contains("\n")));
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_equal(body(samples::ARITHMETIC), [
            "x = 5",
            "y = 3",
            "z = x + y",
            "e = z // 2 # Using integer division",
            "n = -e",
            r#"print("Z: %d" % z)"#,
        ]);
        assert_eq!(body("0: ADD z = x + y"), ["z = x + y"]);
        assert_eq!(body("0: DIV e = a / b"), ["e = a // b # Using integer division"]);
    }

    #[test]
    fn test_while_loop() {
        assert_equal(body(samples::WHILE_LOOP), [
            "while i >= n:",
            "    s = s + i",
        ]);
    }

    #[test]
    fn test_while_condition_table() {
        for (rel, opcode, guard) in [
            ("==", "IF_EQ", "!="), ("!=", "IF_NEQ", "=="), ("<", "IF_LT", ">="),
            (">", "IF_GT", "<="), ("<=", "IF_LEQ", ">"), (">=", "IF_GEQ", "<"),
        ] {
            let source = format!("LABEL L0:\n1: {opcode} a {rel} b GOTO L1\n2: PRINT a\n3: GOTO L0\nLABEL L1:");
            assert_eq!(body(&source), [format!("while a {guard} b:"), "    print(a)".to_string()]);
            let source = format!("0: {opcode} a {rel} b GOTO L1\n1: PRINT a\nLABEL L1:");
            assert_eq!(body(&source), [format!("if a {guard} b:"), "    print(a)".to_string()]);
        }
    }

    #[test]
    fn test_loop_head() {
        assert_equal(body(samples::LOOP_HEAD), [
            "i = 0",
            "while True:",
            "    t0 = i < 10",
            "    if t0 == 0:",
            "        break",
            r#"    print("%d" % i)"#,
            "    i = i + 1",
        ]);
    }

    #[test]
    fn test_if_else() {
        assert_equal(body(samples::IF_ELSE), [
            "if a >= b:",
            "    m = a",
            "else:",
            "    m = b",
            r#"print("max: %d" % m)"#,
        ]);
    }

    #[test]
    fn test_do_while() {
        assert_equal(body(samples::DO_WHILE), [
            "i = 0",
            "while True:",
            r#"    print("%d" % i)"#,
            "    i = i + 1",
            "    if i >= 3:",
            "        break",
        ]);
    }

    #[test]
    fn test_nested() {
        assert_equal(body(samples::NESTED), [
            "i = 0",
            "while i < 10:",
            "    t0 = i % 2",
            "    if t0 == 0:",
            r#"        print("even %d" % i)"#,
            "    else:",
            r#"        print("odd %d" % i)"#,
            "    i = i + 1",
        ]);
        assert_equal(body(samples::NESTED_LOOPS), [
            "i = 0",
            "while i < 3:",
            "    j = 0",
            "    while j < i:",
            "        t0 = i * j",
            r#"        print("%d" % t0)"#,
            "        j = j + 1",
            "    i = i + 1",
        ]);
    }

    #[test]
    fn test_break_continue() {
        assert_equal(body(samples::BREAK_CONTINUE), [
            "i = 0",
            "while i < 100:",
            "    i = i + 1",
            "    if i == 7:",
            "        break",
            "    if i < 3:",
            "        continue",
            "    print(i)",
        ]);
    }

    #[test]
    fn test_implicit_continue() {
        // the body falls through to the exit label
        assert_equal(body(samples::IMPLICIT_CONTINUE), [
            "i = 0",
            "n = 10",
            "while i < n:",
            "    i = i + 1",
            "    if i < 5:",
            "        continue",
            "    print(i)",
            "    break",
        ]);
    }

    #[test]
    fn test_shared_header_label() {
        // the `if` ends at the loop header, the loop is then found from its condition
        let source = indoc::indoc! {"
            0: IF_EQ a == 0 GOTO L0
            1: ASSIGN x = 1
            LABEL L0:
            3: IF_GEQ i >= n GOTO L1
            4: ADD i = i + 1
            5: GOTO L0
            LABEL L1:
        "};
        assert_equal(body(source), [
            "if a != 0:",
            "    x = 1",
            "while i < n:",
            "    i = i + 1",
        ]);
    }

    #[test]
    fn test_stub_only_body() {
        let source = "0: IF_EQ a == 0 GOTO L0\n1: PARAM x\n2: CALL f, 3\nLABEL L0:";
        assert_equal(body(source), [
            "if a != 0:",
            "    # missing parameters: CALL f, 3",
            "    pass",
        ]);
    }

    #[test]
    fn test_calls() {
        assert_equal(body(samples::CALLS), [
            r#"print("%d and %d" % (a, b))"#,
            "r = max(x, 10)",
            "tick()",
        ]);
        assert_equal(body("0: PARAM x\n1: CALL f, 2\n2: CALL g, 1"), [
            "# missing parameters: CALL f, 2",
            "g(x)",
        ]);
        assert_eq!(body("0: PARAM \"hi\"\n1: CALL \"printf\", 1"), [r#"print("hi")"#]);
    }

    #[test]
    fn test_unresolved_label() {
        let lines = body("0: IF_LT a < b GOTO L9\n1: PRINT a");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('#'));
        assert!(lines[0].contains("IF_LT a < b GOTO L9"));
        assert_eq!(lines[1], "print(a)");
        assert_eq!(body("0: GOTO L9"), ["# unresolved jump: GOTO L9"]);
    }

    #[test]
    fn test_unstructured() {
        // a forward goto over code, and a branch out of a loop to somewhere other than its exit
        let source = "0: GOTO L0\n1: PRINT a\nLABEL L0:\n3: PRINT b";
        assert_eq!(body(source), ["print(a)", "print(b)"]);
        assert_equal(strict(source), [
            "# unstructured jump: GOTO L0",
            "print(a)",
            "# unconsumed label: LABEL L0:",
            "print(b)",
        ]);
        let source = indoc::indoc! {"
            LABEL L0:
            1: IF_GEQ i >= n GOTO L1
            2: IF_EQ i == 5 GOTO L2
            3: GOTO L0
            LABEL L1:
            5: PRINT i
            LABEL L2:
        "};
        assert_equal(body(source), [
            "while i < n:",
            "    # unstructured jump: IF_EQ i == 5 GOTO L2",
            "    pass",
            "print(i)",
        ]);
    }

    #[test]
    fn test_malformed_lines() {
        let translation = translate_with(samples::GARBLED.lines(), &Options::default());
        assert_eq!(translation.skipped.len(), 1);
        assert_eq!(translation.skipped[0].line_no, 5);
        let code: Vec<_> = translation.lines.iter()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        assert_eq!(code.len(), 9);
        assert!(translation.lines.iter().all(|line| !line.starts_with("d = ")));
        assert!(code.contains(&&r#"print("done")"#.to_string()));
    }

    #[test]
    fn test_empty() {
        let lines = translate(Vec::<String>::new());
        assert!(lines.iter().any(|line| line == "# (no code generated)"));
        assert!(lines.first().unwrap().starts_with("#="));
        assert!(lines.last().unwrap().starts_with("#="));
        assert_eq!(body("\n   \n"), ["# (no code generated)"]);
        assert_eq!(body("LABEL L0:"), ["# (no code generated)"]);
    }

    #[test]
    fn test_never_panics() {
        for source in [
            "LABEL L0:\n1: GOTO L0",
            "LABEL L0:\nLABEL L0:\n2: IF_EQ a == a GOTO L0",
            "0: IF_EQ a == a GOTO L0\nLABEL L0:\n2: GOTO L0\nLABEL L0:",
            "0: IF_GT a > b GOTO L1\n1: GOTO L0\nLABEL L0:\nLABEL L1:\n4: GOTO L1",
            "LABEL L0:\n1: IF_EQ a == a GOTO L1\n2: IF_EQ a == a GOTO L0\nLABEL L1:",
            "1: CALL f, 9",
            "garbage\n: :\n0:",
        ] {
            let lines = translate(source.lines());
            assert!(!lines.is_empty());
        }
    }
}
