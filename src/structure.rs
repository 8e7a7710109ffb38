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

//! Structure detectors: recognise `while`, `do`/`while` and `if`/`else` idioms in a flat
//! sequence of labels and jumps.
//!
//! Every detector is a pure function of the program, the label index, a start position, and the
//! exclusive end (`limit`) of the range currently being reconstructed. A detected span never
//! reaches past `limit`, so spans found inside a loop or `if` body stay inside that body.
//!
//! The conditions are always rendered by negating the relational test of the branch: a branch
//! leaving a loop, or skipping to an `else`, fires exactly when the structured guard is false.

use std::ops::Range;
use smallvec::{SmallVec, smallvec};
use crate::instr::{Condition, Instr};
use crate::label::LabelIndex;
use crate::program::Program;

/// A `while` loop: `LABEL L; head...; IF_R a b GOTO E; body...; GOTO L; LABEL E`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoopSpan {
    /// Position of the header label `L`.
    pub header: usize,
    /// Straight-line instructions between the header and the branch, evaluated every iteration.
    pub head: Range<usize>,
    /// Position of the conditional branch leaving the loop.
    pub branch: usize,
    /// The loop body.
    pub body: Range<usize>,
    /// Position of the `GOTO L` closing the body, absent for an implicit continue.
    pub back_edge: Option<usize>,
    /// Position of the exit label `E`.
    pub exit: usize,
}

/// A `do`/`while` loop: `LABEL L; body...; IF_R a b GOTO L`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DoWhileSpan {
    /// Position of the header label `L`.
    pub header: usize,
    /// The loop body.
    pub body: Range<usize>,
    /// Position of the conditional branch back to the header.
    pub branch: usize,
}

/// An `if`, with or without `else`:
/// `IF_R a b GOTO E; then...; [GOTO X;] LABEL E; [else...; LABEL X]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IfSpan {
    /// Position of the conditional branch to the else label.
    pub branch: usize,
    /// The then-branch.
    pub then_branch: Range<usize>,
    /// Position of the `GOTO X` skipping over the else-branch.
    pub else_skip: Option<usize>,
    /// Position of the else label `E`.
    pub else_label: usize,
    /// The else-branch, if there is an else-skip.
    pub else_branch: Option<Range<usize>>,
    /// Position of the end label `X`, if it is defined.
    pub end_label: Option<usize>,
}

/// A recognised control flow structure.
#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Structure {
    While(LoopSpan),
    DoWhile(DoWhileSpan),
    If(IfSpan),
}

impl Structure {
    /// The range `[start, end)` of positions consumed by this structure.
    pub fn span(&self) -> Range<usize> {
        match self {
            Structure::While(s) => s.header..s.exit + 1,
            Structure::DoWhile(s) => s.header..s.branch + 1,
            Structure::If(s) => {
                let end = match (&s.else_branch, s.end_label) {
                    (_, Some(end_label)) => end_label + 1,
                    (Some(else_branch), None) => else_branch.end,
                    (None, None) => s.else_label + 1,
                };
                s.branch..end
            }
        }
    }

    /// Positions of the labels and jumps absorbed by this structure. Everything else in the span
    /// belongs to one of the bodies.
    pub fn markers(&self) -> SmallVec<[usize; 4]> {
        let mut markers: SmallVec<[usize; 4]> = match self {
            Structure::While(s) => smallvec![s.header, s.branch, s.exit],
            Structure::DoWhile(s) => smallvec![s.header, s.branch],
            Structure::If(s) => smallvec![s.branch, s.else_label],
        };
        match self {
            Structure::While(LoopSpan { back_edge: Some(k), .. }) => markers.push(*k),
            Structure::If(s) => markers.extend(s.else_skip.into_iter().chain(s.end_label)),
            _ => {}
        }
        markers
    }

    /// Position of the conditional branch this structure is built around.
    pub fn branch(&self) -> usize {
        match self {
            Structure::While(s) => s.branch,
            Structure::DoWhile(s) => s.branch,
            Structure::If(s) => s.branch,
        }
    }

    /// The structured guard: the negation of the branch's own test.
    pub fn guard(&self, program: &Program) -> Option<Condition> {
        program.get(self.branch())?.branching().map(|br| br.condition.negate())
    }
}

/// Whether any jump in `range` targets `label`.
fn jumps_to(program: &Program, range: Range<usize>, label: &str) -> bool {
    program[range].iter().any(|instr| instr.jump_target() == Some(label))
}

/// The label defined at `start`, provided it is the definition jumps to that name resolve to.
fn header_label<'p>(program: &'p Program, labels: &LabelIndex, start: usize) -> Option<&'p str> {
    let name = program.get(start)?.label()?;
    (labels.resolve(name) == Some(start)).then(|| name)
}

/// Detect a `while` loop whose header label is at `start`.
pub fn detect_while(program: &Program, labels: &LabelIndex, start: usize, limit: usize) -> Option<LoopSpan> {
    let limit = limit.min(program.len());
    let header = header_label(program, labels, start)?;
    // only straight-line code may come before the loop condition
    let branch = (start + 1..limit).find(|&k| program[k].is_control())?;
    let br = program[branch].branching()?;
    let exit = labels.resolve(&br.dest)?;
    if exit <= branch || exit >= limit {
        log::trace!("label {} at {}: exit {} is not after the branch at {}", header, start, br.dest, branch);
        return None;
    }
    let back_edge = Some(exit - 1).filter(|&k| k > branch && program[k].is_goto_to(header));
    if back_edge.is_none() && !jumps_to(program, branch + 1..exit, header) {
        log::trace!("label {} at {}: nothing jumps back, not a loop", header, start);
        return None;
    }
    let body = branch + 1..back_edge.unwrap_or(exit);
    log::debug!("while loop at {}..={} (header {}, exit {})", start, exit, header, br.dest);
    Some(LoopSpan { header: start, head: start + 1..branch, branch, body, back_edge, exit })
}

/// Detect a `do`/`while` loop whose header label is at `start`.
pub fn detect_do_while(program: &Program, labels: &LabelIndex, start: usize, limit: usize) -> Option<DoWhileSpan> {
    let limit = limit.min(program.len());
    let header = header_label(program, labels, start)?;
    let branch = (start + 1..limit)
        .find(|&k| matches!(program[k].branching(), Some(br) if br.dest == header))?;
    log::debug!("do-while loop at {}..={} (header {})", start, branch, header);
    Some(DoWhileSpan { header: start, body: start + 1..branch, branch })
}

/// Detect an `if` (possibly with an `else`) whose conditional branch is at `start`.
pub fn detect_if_else(program: &Program, labels: &LabelIndex, start: usize, limit: usize) -> Option<IfSpan> {
    let limit = limit.min(program.len());
    let br = program.get(start)?.branching()?;
    let else_label = labels.resolve(&br.dest)?;
    if else_label <= start || else_label >= limit {
        log::trace!("branch at {}: else label {} is outside {}..{}", start, br.dest, start, limit);
        return None;
    }
    let if_only = IfSpan {
        branch: start,
        then_branch: start + 1..else_label,
        else_skip: None,
        else_label,
        else_branch: None,
        end_label: None,
    };
    let skip = else_label - 1;
    let end = match &program[skip] {
        Instr::Goto(end) if skip > start => end,
        _ => {
            log::debug!("if at {}..={}", start, else_label);
            return Some(if_only);
        }
    };
    let with_else = |else_branch: Range<usize>, end_label: Option<usize>| {
        log::debug!("if-else at {}..{} (else label {}, end label {})", start, else_branch.end, br.dest, end);
        Some(IfSpan {
            then_branch: start + 1..skip,
            else_skip: Some(skip),
            else_branch: Some(else_branch),
            end_label,
            ..if_only.clone()
        })
    };
    match labels.resolve(end) {
        // the end label is missing: the else-branch runs until the end of the range
        None => with_else(else_label + 1..limit, None),
        Some(x) if x == else_label => Some(IfSpan {
            then_branch: start + 1..skip,
            else_skip: Some(skip),
            ..if_only.clone()
        }),
        Some(x) if x > else_label && x < limit => with_else(else_label + 1..x, Some(x)),
        // jumping back to the label right before the branch: this is a loop, not an `if`
        Some(x) if x + 1 == start => {
            log::trace!("branch at {}: {} closes a loop", start, end);
            None
        }
        // `break`, `continue`, or something unstructured inside the then-branch
        Some(_) => Some(if_only),
    }
}

/// Detect a `while` loop entered from its conditional branch at `start`, looking back at the
/// header label right before it.
pub fn detect_while_lookback(program: &Program, labels: &LabelIndex, start: usize, limit: usize)
                             -> Option<LoopSpan> {
    let limit = limit.min(program.len());
    let br = program.get(start)?.branching()?;
    let header = start.checked_sub(1)?;
    let header_name = header_label(program, labels, header)?;
    let exit = labels.resolve(&br.dest)?;
    if exit <= start || exit >= limit { return None; }
    let back_edge = exit - 1;
    if back_edge <= start || !program[back_edge].is_goto_to(header_name) { return None; }
    log::debug!("while loop at {}..={}, found from its condition", header, exit);
    Some(LoopSpan {
        header,
        head: start..start,
        branch: start,
        body: start + 1..back_edge,
        back_edge: Some(back_edge),
        exit,
    })
}

/// Try all the detectors at `start`, in priority order.
///
/// At a label: `while`, then `do`/`while`. At a conditional branch: `if`/`else`, then `while`
/// by looking back at the header label.
pub fn detect(program: &Program, labels: &LabelIndex, start: usize, limit: usize) -> Option<Structure> {
    match program.get(start)? {
        Instr::Label(_) => detect_while(program, labels, start, limit).map(Structure::While)
            .or_else(|| detect_do_while(program, labels, start, limit).map(Structure::DoWhile)),
        Instr::Branch(_) => detect_if_else(program, labels, start, limit).map(Structure::If)
            .or_else(|| detect_while_lookback(program, labels, start, limit).map(Structure::While)),
        _ => None,
    }
}
