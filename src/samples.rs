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

//! Sample quadruple programs, in the shape a front end emits them.
//!
//! Parameters are pushed right to left, so the first argument is the last `PARAM`.

use indoc::indoc;

pub const ARITHMETIC: &str = indoc! {r#"
    0: ASSIGN x = 5
    1: ASSIGN y = 3
    2: ADD z = x + y
    3: DIV e = z / 2
    4: UMINUS n = - e
    5: PRINT "Z: %d", z
"#};

pub const WHILE_LOOP: &str = indoc! {"
    LABEL L0:
    1: IF_LT i < n GOTO L1
    2: ADD s = s + i
    3: GOTO L0:
    LABEL L1:
"};

pub const LOOP_HEAD: &str = indoc! {r#"
    0: ASSIGN i = 0
    LABEL L0:
    2: LT t0 = i < 10
    3: IF_EQ t0 == 0 GOTO L1
    4: PRINT "%d", i
    5: ADD i = i + 1
    6: GOTO L0
    LABEL L1:
"#};

pub const IF_ELSE: &str = indoc! {r#"
    0: IF_LT a < b GOTO L0
    1: ASSIGN m = a
    2: GOTO L1
    LABEL L0:
    4: ASSIGN m = b
    LABEL L1:
    6: PRINT "max: %d", m
"#};

pub const DO_WHILE: &str = indoc! {r#"
    0: ASSIGN i = 0
    LABEL L0:
    2: PRINT "%d", i
    3: ADD i = i + 1
    4: IF_LT i < 3 GOTO L0
"#};

pub const NESTED: &str = indoc! {r#"
    0: ASSIGN i = 0
    LABEL L0:
    2: IF_GEQ i >= 10 GOTO L1
    3: MOD t0 = i % 2
    4: IF_NEQ t0 != 0 GOTO L2
    5: PRINT "even %d", i
    6: GOTO L3
    LABEL L2:
    8: PRINT "odd %d", i
    LABEL L3:
    10: ADD i = i + 1
    11: GOTO L0
    LABEL L1:
"#};

pub const NESTED_LOOPS: &str = indoc! {r#"
    0: ASSIGN i = 0
    LABEL L0:
    2: IF_GEQ i >= 3 GOTO L1
    3: ASSIGN j = 0
    LABEL L2:
    5: IF_GEQ j >= i GOTO L3
    6: MUL t0 = i * j
    7: PRINT "%d", t0
    8: ADD j = j + 1
    9: GOTO L2
    LABEL L3:
    11: ADD i = i + 1
    12: GOTO L0
    LABEL L1:
"#};

pub const BREAK_CONTINUE: &str = indoc! {"
    0: ASSIGN i = 0
    LABEL L0:
    2: IF_GEQ i >= 100 GOTO L1
    3: ADD i = i + 1
    4: IF_EQ i == 7 GOTO L1
    5: IF_LT i < 3 GOTO L0
    6: PRINT i
    7: GOTO L0
    LABEL L1:
"};

pub const IMPLICIT_CONTINUE: &str = indoc! {"
    0: ASSIGN i = 0
    1: ASSIGN n = 10
    LABEL L0:
    3: IF_GEQ i >= n GOTO L1
    4: ADD i = i + 1
    5: IF_LT i < 5 GOTO L0
    6: PRINT i
    LABEL L1:
"};

pub const CALLS: &str = indoc! {r#"
    0: PARAM b
    1: PARAM a
    2: PARAM "%d and %d"
    3: CALL printf, 3
    4: PARAM 10
    5: PARAM x
    6: CALL r = max, 2
    7: CALL tick, 0
"#};

pub const GARBLED: &str = indoc! {r#"
    0: ASSIGN a = 8
    1: ASSIGN b = 2
    2: SUB c = a - b
    3: MOD m = a % b
    4: MUL d = a *
    5: DIV e = a / b
    6: UMINUS f = - a
    7: PRINT "C: %d", c
    8: PRINT "E: %d", e
    9: PRINT "done"
"#};

pub const ALL_SAMPLES: &[&str] = &[
    ARITHMETIC, WHILE_LOOP, LOOP_HEAD, IF_ELSE, DO_WHILE,
    NESTED, NESTED_LOOPS, BREAK_CONTINUE, IMPLICIT_CONTINUE, CALLS, GARBLED,
];
