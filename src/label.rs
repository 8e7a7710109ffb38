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

//! Label index: where is each label defined?

use std::collections::HashMap;
use crate::instr::Instr;
use crate::program::Program;

/// Mapping from label name to the position of its `LABEL` instruction.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LabelIndex {
    positions: HashMap<String, usize>,
    duplicates: Vec<(String, usize)>,
}

impl LabelIndex {
    /// Build the index in a single pass. A repeated label overwrites the earlier definition.
    pub fn from_program(program: &Program) -> LabelIndex {
        let mut index = LabelIndex::default();
        for (k, instr) in program.iter().enumerate() {
            if let Instr::Label(name) = instr {
                if let Some(previous) = index.positions.insert(name.clone(), k) {
                    log::debug!("label {} defined at both {} and {}, keeping the latter", name, previous, k);
                    index.duplicates.push((name.clone(), previous));
                }
            }
        }
        index
    }

    /// Position of the definition of this label.
    pub fn resolve(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    /// Earlier definitions shadowed by a later one with the same name, in input order.
    pub fn duplicates(&self) -> &[(String, usize)] { &self.duplicates }

    /// Number of distinct labels.
    pub fn len(&self) -> usize { self.positions.len() }

    /// Whether no label is defined at all.
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }
}

#[cfg(test)]
mod tests {
    use crate::samples;
    use crate::program::read_program;
    use super::LabelIndex;

    #[test]
    fn test_label_index() {
        let listing = read_program(samples::WHILE_LOOP.lines());
        let labels = LabelIndex::from_program(&listing.program);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.resolve("L0"), Some(0));
        assert_eq!(labels.resolve("L1"), Some(4));
        assert_eq!(labels.resolve("L2"), None);
        assert!(labels.duplicates().is_empty());
    }

    #[test]
    fn test_last_definition_wins() {
        let listing = read_program(indoc::indoc! {"
            LABEL A:
            1: ASSIGN x = 1
            LABEL A:
        "}.lines());
        let labels = LabelIndex::from_program(&listing.program);
        assert_eq!(labels.resolve("A"), Some(2));
        assert_eq!(labels.duplicates(), &[("A".to_string(), 0)]);
    }
}
