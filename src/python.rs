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

//! Python expressions and statements.

use std::fmt::{Arguments, Display, Formatter, Write};
use itertools::Itertools;
use crate::instr::{BOp, Condition, Instr, Operand, UOp};

/// One level of indentation.
pub const INDENT: &str = "    ";

/// Python expressions.
#[allow(missing_docs)]
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Expr {
    Operand(Operand),
    Binary { op: BOp, lhs: Operand, rhs: Operand },
    Neg(Operand),
    Call { callee: String, args: Box<[Operand]> },
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Operand(x) => write!(f, "{x}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.pretty()),
            Expr::Neg(x) => write!(f, "-{x}"),
            Expr::Call { callee, args } => write!(f, "{callee}({})", args.iter().format(", ")),
        }
    }
}

/// Python statements.
#[allow(missing_docs)]
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Statement {
    Assignment { dest: String, source: Expr },
    /// Expression statement, only used for calls.
    Expr(Expr),
    /// `print`, with a format string (or a plain value) followed by the values.
    Print(Box<[Operand]>),
    If {
        condition: Condition,
        then_branch: Box<[Statement]>,
        else_branch: Option<Box<[Statement]>>,
    },
    /// A `while` loop, `while True` if there is no condition.
    While {
        condition: Option<Condition>,
        loop_body: Box<[Statement]>,
    },
    Break,
    Continue,
    /// A comment line, without the leading `#`.
    Comment(String),
}

pub(crate) fn write_indented<W>(f: &mut W, v: Arguments, buffer: &mut String) -> std::fmt::Result
    where W: Write + ?Sized {
    buffer.clear();
    writeln!(buffer, "{}", v)?;
    for line in buffer.lines() {
        write!(f, "\n{INDENT}{line}")?;
    }
    Ok(())
}

/// Suite of a compound statement, one level deeper. Never empty.
struct Suite<'a>(&'a [Statement]);

impl<'a> Display for Suite<'a> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let mut buffer = String::new();
        for statement in self.0 {
            write_indented(f, format_args!("{}", statement), &mut buffer)?;
        }
        // comments alone do not make a block
        if self.0.iter().all(Statement::is_comment) { write!(f, "\n{INDENT}pass")?; }
        Ok(())
    }
}

fn write_print(f: &mut Formatter<'_>, args: &[Operand]) -> std::fmt::Result {
    match args {
        [format @ Operand::Str(_)] => write!(f, "print({format})"),
        [format @ Operand::Str(_), value] => write!(f, "print({format} % {value})"),
        [format @ Operand::Str(_), values @ ..] =>
            write!(f, "print({format} % ({}))", values.iter().format(", ")),
        values => write!(f, "print({})", values.iter().format(", ")),
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Assignment { dest, source } => {
                write!(f, "{dest} = {source}")?;
                if let Expr::Binary { op: BOp::Div, .. } = source {
                    write!(f, " # Using integer division")?;
                }
                Ok(())
            }
            Statement::Expr(expr) => write!(f, "{expr}"),
            Statement::Print(args) => write_print(f, args),
            Statement::If { condition, then_branch, else_branch } => {
                write!(f, "if {condition}:{}", Suite(then_branch))?;
                if let Some(else_branch) = else_branch {
                    write!(f, "\nelse:{}", Suite(else_branch))?;
                }
                Ok(())
            }
            Statement::While { condition: Some(condition), loop_body } =>
                write!(f, "while {condition}:{}", Suite(loop_body)),
            Statement::While { condition: None, loop_body } =>
                write!(f, "while True:{}", Suite(loop_body)),
            Statement::Break => write!(f, "break"),
            Statement::Continue => write!(f, "continue"),
            Statement::Comment(text) => write!(f, "# {text}"),
        }
    }
}

impl Statement {
    /// Whether this is a comment, which is no statement as far as Python is concerned.
    pub fn is_comment(&self) -> bool { matches!(self, Statement::Comment(_)) }

    /// Translate a straight-line instruction on its own.
    ///
    /// Labels, jumps, and the `PARAM`/`CALL` pair need context, and produce `None` here.
    pub fn from_instr(instr: &Instr) -> Option<Statement> {
        Some(match instr {
            Instr::Assign { dest, source } =>
                Statement::Assignment { dest: dest.clone(), source: Expr::Operand(source.clone()) },
            Instr::Binary { op, dest, lhs, rhs } => Statement::Assignment {
                dest: dest.clone(),
                source: Expr::Binary { op: *op, lhs: lhs.clone(), rhs: rhs.clone() },
            },
            Instr::Unary { op: UOp::Neg, dest, operand } =>
                Statement::Assignment { dest: dest.clone(), source: Expr::Neg(operand.clone()) },
            Instr::Print(args) => Statement::Print(args.iter().cloned().collect()),
            Instr::Param(_) | Instr::Call { .. }
            | Instr::Label(_) | Instr::Goto(_) | Instr::Branch(_) => return None,
        })
    }

    /// A call with its arguments already collected. `printf` becomes a `print`.
    pub fn call(dest: Option<String>, callee: &str, args: Vec<Operand>) -> Statement {
        match dest {
            None if callee == "printf" => Statement::Print(args.into_boxed_slice()),
            None => Statement::Expr(Expr::Call { callee: callee.to_string(), args: args.into_boxed_slice() }),
            Some(dest) => Statement::Assignment {
                dest,
                source: Expr::Call { callee: callee.to_string(), args: args.into_boxed_slice() },
            },
        }
    }

    /// Render this statement with every line indented `level` times.
    pub fn render(&self, level: usize) -> String {
        let prefix = INDENT.repeat(level);
        self.to_string().lines().map(|line| format!("{prefix}{line}")).join("\n")
    }
}

/// Translate one straight-line instruction into (possibly indented) Python code.
pub fn emit_statement(instr: &Instr, level: usize) -> Option<String> {
    Statement::from_instr(instr).map(|s| s.render(level))
}

const HEADER: &str = indoc::indoc! {"
    #======================================
    # Automatically Generated Python Code #
    #======================================
"};

const FOOTER: &str = indoc::indoc! {"
    #========================================
    #        End of Generated Code         #
    #========================================
"};

/// Placeholder for a module without any statement.
pub const EMPTY_MODULE: &str = "# (no code generated)";

/// A complete Python module.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Module {
    /// Top level statements.
    pub body: Box<[Statement]>,
    /// Whether to surround the code with the banner comments.
    pub banner: bool,
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.banner { writeln!(f, "{}\n", HEADER.trim_end())?; }
        if self.body.is_empty() { writeln!(f, "{EMPTY_MODULE}")?; }
        for statement in self.body.iter() {
            writeln!(f, "{statement}")?;
        }
        if self.banner { writeln!(f, "\n{}", FOOTER.trim_end())?; }
        Ok(())
    }
}
