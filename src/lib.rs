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

//! Translate goto-based quadruples back to structured Python code.
//!
//! Input format: one instruction per line, `<index>: <OPCODE> <operands...>`, with operands
//! separated by whitespace or commas. Label definitions may omit the index:
//!
//! ```text
//! LABEL L0:
//! 1: IF_LT i < n GOTO L1
//! 2: ADD s = s + i
//! 3: GOTO L0
//! LABEL L1:
//! ```
//!
//! Translation is total: malformed lines are dropped, and jumps which fit no `while`, `if` or
//! `if`/`else` shape are kept as comments in the output.

#![warn(missing_docs)]

pub mod instr;
pub mod program;
pub mod label;
pub mod structure;
pub mod python;
pub mod translate;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::Cli;

#[cfg(test)]
mod samples;

pub use instr::Instr;
pub use program::{Program, read_program, display_program};
pub use label::LabelIndex;
pub use translate::{translate, translate_with, Options, Translation};
