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

//! Instructions for quadruple code.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use itertools::Itertools;
use parse_display::{Display, FromStr};
use smallvec::{SmallVec, smallvec};

use crate::program::ParseError;

/// All the opcodes recognised in the input.
#[derive(Debug, Display, FromStr, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[display(style = "SNAKE_CASE")]
#[allow(missing_docs)]
pub enum Opcode {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Uminus,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Print,
    Param,
    Call,
    Label,
    Goto,
    IfEq,
    IfNeq,
    IfLt,
    IfGt,
    IfLeq,
    IfGeq,
}

impl Opcode {
    /// The relational test performed by a conditional branch opcode.
    pub fn branch_rel(self) -> Option<Rel> {
        Some(match self {
            Opcode::IfEq => Rel::Eq,
            Opcode::IfNeq => Rel::Neq,
            Opcode::IfLt => Rel::Lt,
            Opcode::IfGt => Rel::Gt,
            Opcode::IfLeq => Rel::Leq,
            Opcode::IfGeq => Rel::Geq,
            _ => return None,
        })
    }

    /// The binary operator computed by a value-producing opcode.
    pub fn binary_op(self) -> Option<BOp> {
        Some(match self {
            Opcode::Add => BOp::Add,
            Opcode::Sub => BOp::Sub,
            Opcode::Mul => BOp::Mul,
            Opcode::Div => BOp::Div,
            Opcode::Mod => BOp::Mod,
            Opcode::Eq => BOp::Cmp(Rel::Eq),
            Opcode::Neq => BOp::Cmp(Rel::Neq),
            Opcode::Lt => BOp::Cmp(Rel::Lt),
            Opcode::Gt => BOp::Cmp(Rel::Gt),
            Opcode::Lte => BOp::Cmp(Rel::Leq),
            Opcode::Gte => BOp::Cmp(Rel::Geq),
            _ => return None,
        })
    }
}

/// Relational operators, shared by conditional branches and comparison instructions.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum Rel {
    Eq,
    Neq,
    Lt,
    Gt,
    Leq,
    Geq,
}

impl Rel {
    /// Logical negation: `a R b` is false exactly when `a R.negate() b` is true.
    pub fn negate(self) -> Rel {
        match self {
            Rel::Eq => Rel::Neq,
            Rel::Neq => Rel::Eq,
            Rel::Lt => Rel::Geq,
            Rel::Geq => Rel::Lt,
            Rel::Gt => Rel::Leq,
            Rel::Leq => Rel::Gt,
        }
    }

    /// Opcode of the conditional branch testing this relation.
    pub fn branch_opcode(self) -> Opcode {
        match self {
            Rel::Eq => Opcode::IfEq,
            Rel::Neq => Opcode::IfNeq,
            Rel::Lt => Opcode::IfLt,
            Rel::Gt => Opcode::IfGt,
            Rel::Leq => Opcode::IfLeq,
            Rel::Geq => Opcode::IfGeq,
        }
    }

    /// Operator symbol, the same in quadruple code and in Python.
    pub fn symbol(self) -> &'static str {
        match self {
            Rel::Eq => "==",
            Rel::Neq => "!=",
            Rel::Lt => "<",
            Rel::Gt => ">",
            Rel::Leq => "<=",
            Rel::Geq => ">=",
        }
    }
}

impl Display for Rel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Binary operators.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum BOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Cmp(Rel),
}

impl BOp {
    /// Opcode computing this operator.
    pub fn opcode(self) -> Opcode {
        match self {
            BOp::Add => Opcode::Add,
            BOp::Sub => Opcode::Sub,
            BOp::Mul => Opcode::Mul,
            BOp::Div => Opcode::Div,
            BOp::Mod => Opcode::Mod,
            BOp::Cmp(Rel::Eq) => Opcode::Eq,
            BOp::Cmp(Rel::Neq) => Opcode::Neq,
            BOp::Cmp(Rel::Lt) => Opcode::Lt,
            BOp::Cmp(Rel::Gt) => Opcode::Gt,
            BOp::Cmp(Rel::Leq) => Opcode::Lte,
            BOp::Cmp(Rel::Geq) => Opcode::Gte,
        }
    }

    /// Operator symbol as written in quadruple code.
    pub fn symbol(self) -> &'static str {
        match self {
            BOp::Add => "+",
            BOp::Sub => "-",
            BOp::Mul => "*",
            BOp::Div => "/",
            BOp::Mod => "%",
            BOp::Cmp(rel) => rel.symbol(),
        }
    }

    /// Operator symbol in Python. Division is always integer division.
    pub fn pretty(self) -> &'static str {
        match self {
            BOp::Div => "//",
            op => op.symbol(),
        }
    }
}

/// Unary operators.
#[derive(Debug, Display, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum UOp {
    #[display("-")]
    Neg,
}

/// Operands, kept verbatim as they appear in the source text.
#[derive(Debug, Display, FromStr, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Operand {
    /// Double-quoted string literal (backslash escapes allowed), quotes included.
    #[display("{0}")]
    #[from_str(regex = r#"(?P<0>"(?:[^"\\]|\\.)*")"#)]
    Str(String),
    /// Integer or decimal literal.
    #[display("{0}")]
    #[from_str(regex = r"(?P<0>[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))")]
    Number(String),
    /// Anything else: a variable or a temporary.
    #[display("{0}")]
    #[from_str(regex = r#"(?P<0>[^\s,"]+)"#)]
    Ident(String),
}

impl Operand {
    /// Whether this operand is a quoted string literal.
    pub fn is_string(&self) -> bool { matches!(self, Operand::Str(_)) }

    /// The source text of this operand.
    pub fn as_str(&self) -> &str {
        match self {
            Operand::Str(s) | Operand::Number(s) | Operand::Ident(s) => s,
        }
    }
}

/// Relational test `lhs rel rhs`.
#[derive(Debug, Display, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[display("{lhs} {rel} {rhs}")]
pub struct Condition {
    /// Left hand side.
    pub lhs: Operand,
    /// The relation being tested.
    pub rel: Rel,
    /// Right hand side.
    pub rhs: Operand,
}

impl Condition {
    /// The logical negation of this test.
    pub fn negate(&self) -> Condition {
        Condition { rel: self.rel.negate(), ..self.clone() }
    }
}

/// Conditional branching instructions.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Branching {
    /// Jump is taken when this test holds.
    pub condition: Condition,
    /// Name of the target label.
    pub dest: String,
}

/// Number of operands for an instruction.
pub trait HasOperand<Operand> {
    /// Value operands read by this instruction, in source order.
    fn get_operands(&self) -> SmallVec<[&Operand; 2]>;
}

/// Instructions.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum Instr {
    /// `dest = source`.
    Assign { dest: String, source: Operand },
    /// Arithmetic and comparisons.
    Binary { op: BOp, dest: String, lhs: Operand, rhs: Operand },
    /// Unary operations.
    Unary { op: UOp, dest: String, operand: Operand },
    /// Formatted output: a format string (or a single value), followed by the values.
    Print(SmallVec<[Operand; 2]>),
    /// Push an actual parameter for a later [`Instr::Call`].
    Param(Operand),
    /// Call `callee` with the last `arg_count` parameters.
    Call { dest: Option<String>, callee: String, arg_count: usize },
    /// Label definition.
    Label(String),
    /// Unconditional jump.
    Goto(String),
    /// Conditional jump.
    Branch(Branching),
}

impl Instr {
    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instr::Assign { .. } => Opcode::Assign,
            Instr::Binary { op, .. } => op.opcode(),
            Instr::Unary { op: UOp::Neg, .. } => Opcode::Uminus,
            Instr::Print(_) => Opcode::Print,
            Instr::Param(_) => Opcode::Param,
            Instr::Call { .. } => Opcode::Call,
            Instr::Label(_) => Opcode::Label,
            Instr::Goto(_) => Opcode::Goto,
            Instr::Branch(br) => br.condition.rel.branch_opcode(),
        }
    }

    /// The destination: the assigned variable, or the target label of a jump.
    pub fn dest(&self) -> Option<&str> {
        match self {
            Instr::Assign { dest, .. }
            | Instr::Binary { dest, .. }
            | Instr::Unary { dest, .. } => Some(dest),
            Instr::Call { dest, .. } => dest.as_deref(),
            Instr::Goto(label) => Some(label),
            Instr::Branch(br) => Some(&br.dest),
            _ => None,
        }
    }

    /// Target label of a (conditional or unconditional) jump.
    pub fn jump_target(&self) -> Option<&str> {
        match self {
            Instr::Goto(label) => Some(label),
            Instr::Branch(br) => Some(&br.dest),
            _ => None,
        }
    }

    /// Name of the label defined here, if this is a label definition.
    pub fn label(&self) -> Option<&str> {
        match self {
            Instr::Label(name) => Some(name),
            _ => None,
        }
    }

    /// Conditional branching details, if this is a conditional jump.
    pub fn branching(&self) -> Option<&Branching> {
        match self {
            Instr::Branch(br) => Some(br),
            _ => None,
        }
    }

    /// Labels and jumps are absorbed by structure reconstruction.
    pub fn is_control(&self) -> bool {
        matches!(self, Instr::Label(_) | Instr::Goto(_) | Instr::Branch(_))
    }

    /// Whether this is a `GOTO label` for exactly this label.
    pub fn is_goto_to(&self, label: &str) -> bool {
        matches!(self, Instr::Goto(l) if l == label)
    }
}

/// An instruction split into its opcode and the rest.
#[derive(FromStr)]
#[from_str(regex = r"\s*(?P<opcode>[A-Za-z_]+)\s*(?P<operands>.*?)\s*")]
struct InstrText {
    opcode: String,
    operands: String,
}

/// `dst = src`
#[derive(FromStr)]
#[from_str(regex = r#"(?P<dest>[^\s,:"=]+)\s*=\s*(?P<source>"(?:[^"\\]|\\.)*"|[^\s,"]+)"#)]
struct AssignShape {
    dest: String,
    source: Operand,
}

/// `dst = a OP b`, the operator is implied by the opcode.
#[derive(FromStr)]
#[from_str(regex = r#"(?P<dest>[^\s,:"=]+)\s*=\s*(?P<lhs>"(?:[^"\\]|\\.)*"|[^\s,"]+)\s+[-+*/%<>=!]+\s+(?P<rhs>"(?:[^"\\]|\\.)*"|[^\s,"]+)"#)]
struct BinaryShape {
    dest: String,
    lhs: Operand,
    rhs: Operand,
}

/// `dst = - a`, or `dst = -a`.
#[derive(FromStr)]
#[from_str(regex = r#"(?P<dest>[^\s,:"=]+)\s*=\s*-\s*(?P<operand>"(?:[^"\\]|\\.)*"|[^\s,"]+)"#)]
struct UnaryShape {
    dest: String,
    operand: Operand,
}

/// `a REL b GOTO label`, the relation is implied by the opcode.
#[derive(FromStr)]
#[from_str(regex = r#"(?P<lhs>"(?:[^"\\]|\\.)*"|[^\s,"]+)\s+(?:==|!=|<=|>=|<|>)\s+(?P<rhs>"(?:[^"\\]|\\.)*"|[^\s,"]+)\s+(?i:goto)\s+(?P<dest>[^\s,:"=]+)\s*:?"#)]
struct BranchShape {
    lhs: Operand,
    rhs: Operand,
    dest: String,
}

/// Label name, with an optional trailing colon.
#[derive(FromStr)]
#[from_str(regex = r#"(?P<name>[^\s,:"=]+)\s*:?"#)]
struct LabelName {
    name: String,
}

/// `name, n`, the name possibly quoted.
#[derive(FromStr)]
#[from_str(regex = r#""?(?P<callee>[^\s,:"=]+)"?(?:\s*,\s*|\s+)(?P<arg_count>[0-9]+)"#)]
struct CallShape {
    callee: String,
    arg_count: usize,
}

/// `dst = name, n`
#[derive(FromStr)]
#[from_str(regex = r#"(?P<dest>[^\s,:"=]+)\s*=\s*"?(?P<callee>[^\s,:"=]+)"?(?:\s*,\s*|\s+)(?P<arg_count>[0-9]+)"#)]
struct CallAssignShape {
    dest: String,
    callee: String,
    arg_count: usize,
}

/// First operand of a list, and everything after it.
#[derive(FromStr)]
#[from_str(regex = r#"\s*,?\s*(?P<head>"(?:[^"\\]|\\.)*"|[^\s,"]+)(?P<tail>.*)"#)]
struct OperandList {
    head: Operand,
    tail: String,
}

fn parse_shape<T: FromStr>(opcode: Opcode, operands: &str, shape: &'static str) -> Result<T, ParseError> {
    operands.parse().map_err(|_| ParseError::Malformed { opcode, shape, found: operands.to_string() })
}

fn parse_operand_list(operands: &str) -> Result<SmallVec<[Operand; 2]>, ParseError> {
    let malformed = || ParseError::Malformed {
        opcode: Opcode::Print,
        shape: "\"fmt\", args...",
        found: operands.to_string(),
    };
    let mut args = SmallVec::new();
    let mut rest = operands.to_string();
    while !rest.is_empty() {
        let OperandList { head, tail } = rest.parse().map_err(|_| malformed())?;
        args.push(head);
        rest = tail;
    }
    if args.is_empty() { return Err(malformed()); }
    Ok(args)
}

impl FromStr for Instr {
    type Err = ParseError;
    /// Parse an instruction (without the leading `<index>:`).
    fn from_str(s: &str) -> Result<Instr, ParseError> {
        let InstrText { opcode: name, operands } = s.parse().map_err(|_| ParseError::MissingOpcode)?;
        let opcode = name.parse::<Opcode>().map_err(|_| ParseError::UnknownOpcode(name.clone()))?;
        let operands = operands.as_str();
        Ok(match opcode {
            Opcode::Assign => {
                let AssignShape { dest, source } = parse_shape(opcode, operands, "dst = src")?;
                Instr::Assign { dest, source }
            }
            Opcode::Uminus => {
                let UnaryShape { dest, operand } = parse_shape(opcode, operands, "dst = - a")?;
                Instr::Unary { op: UOp::Neg, dest, operand }
            }
            Opcode::Print => Instr::Print(parse_operand_list(operands)?),
            Opcode::Param => Instr::Param(parse_shape(opcode, operands, "a")?),
            Opcode::Call => {
                const SHAPE: &str = "[dst =] name, n";
                match parse_shape::<CallShape>(opcode, operands, SHAPE) {
                    Ok(CallShape { callee, arg_count }) => Instr::Call { dest: None, callee, arg_count },
                    Err(_) => {
                        let CallAssignShape { dest, callee, arg_count } = parse_shape(opcode, operands, SHAPE)?;
                        Instr::Call { dest: Some(dest), callee, arg_count }
                    }
                }
            }
            Opcode::Label => Instr::Label(parse_shape::<LabelName>(opcode, operands, "name:")?.name),
            Opcode::Goto => Instr::Goto(parse_shape::<LabelName>(opcode, operands, "label")?.name),
            _ => match (opcode.branch_rel(), opcode.binary_op()) {
                (Some(rel), _) => {
                    let BranchShape { lhs, rhs, dest } = parse_shape(opcode, operands, "a REL b GOTO label")?;
                    Instr::Branch(Branching { condition: Condition { lhs, rel, rhs }, dest })
                }
                (None, Some(op)) => {
                    let BinaryShape { dest, lhs, rhs } = parse_shape(opcode, operands, "dst = a OP b")?;
                    Instr::Binary { op, dest, lhs, rhs }
                }
                (None, None) => return Err(ParseError::UnknownOpcode(name)),
            },
        })
    }
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let opcode = self.opcode();
        match self {
            Instr::Assign { dest, source } => write!(f, "{opcode} {dest} = {source}"),
            Instr::Binary { op, dest, lhs, rhs } =>
                write!(f, "{opcode} {dest} = {lhs} {} {rhs}", op.symbol()),
            Instr::Unary { op, dest, operand } => write!(f, "{opcode} {dest} = {op} {operand}"),
            Instr::Print(args) => write!(f, "{opcode} {}", args.iter().format(", ")),
            Instr::Param(operand) => write!(f, "{opcode} {operand}"),
            Instr::Call { dest, callee, arg_count } => {
                write!(f, "{opcode} ")?;
                if let Some(dest) = dest { write!(f, "{dest} = ")?; }
                write!(f, "{callee}, {arg_count}")
            }
            Instr::Label(name) => write!(f, "{opcode} {name}:"),
            Instr::Goto(label) => write!(f, "{opcode} {label}"),
            Instr::Branch(Branching { condition, dest }) =>
                write!(f, "{opcode} {condition} GOTO {dest}"),
        }
    }
}

impl HasOperand<Operand> for Instr {
    fn get_operands(&self) -> SmallVec<[&Operand; 2]> {
        match self {
            Instr::Assign { source, .. } => smallvec![source],
            Instr::Binary { lhs, rhs, .. } => smallvec![lhs, rhs],
            Instr::Unary { operand, .. } => smallvec![operand],
            Instr::Print(args) => args.iter().collect(),
            Instr::Param(operand) => smallvec![operand],
            Instr::Branch(br) => smallvec![&br.condition.lhs, &br.condition.rhs],
            Instr::Call { .. } | Instr::Label(_) | Instr::Goto(_) => SmallVec::new(),
        }
    }
}
