// ── Call directory ──
//
// Immutable snapshot mapping line ids to labels and types for the current
// position selection. Rebuilt from scratch on every bootstrap and swapped
// in whole; nothing mutates a published directory.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{LineDef, LineSlot, LineType, Position};

/// Built-in debug line present in every directory.
pub const TEST_LINE_ID: &str = "891";
pub const TEST_LINE_LABEL: &str = "TEST";

/// One registrable directory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub line_id: String,
    pub label: String,
    pub line_type: LineType,
    /// Slot index in the concatenated line lists; `None` for the test line.
    pub slot: Option<usize>,
}

impl DirectoryEntry {
    fn from_def(def: &LineDef, slot: usize) -> Self {
        Self {
            line_id: def.id.clone(),
            label: def.label.clone(),
            line_type: def.line_type,
            slot: Some(slot),
        }
    }

    fn test_line() -> Self {
        Self {
            line_id: TEST_LINE_ID.into(),
            label: TEST_LINE_LABEL.into(),
            line_type: LineType::Shout,
            slot: None,
        }
    }
}

/// Deduplicated, order-preserving directory for a position selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallDirectory {
    entries: Vec<DirectoryEntry>,
    /// Slot indices of intentional gaps, ascending.
    placeholders: Vec<usize>,
    /// `line id → slot index` of the first occurrence.
    order: IndexMap<String, usize>,
    slot_count: usize,
}

impl CallDirectory {
    /// Build the directory for `positions`, in selection order.
    ///
    /// The slot counter runs across all positions and advances for every
    /// slot, placeholders and rejected duplicates included, so placeholder
    /// and order indices line up with the concatenated line lists.
    pub fn build<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Self {
        let mut entries = Vec::new();
        let mut placeholders = Vec::new();
        let mut order = IndexMap::new();
        let mut non_shout: HashSet<&str> = HashSet::new();
        let mut slot = 0;

        for position in positions {
            for line in &position.lines {
                match line {
                    LineSlot::Placeholder => placeholders.push(slot),
                    LineSlot::Line(def) => {
                        order.entry(def.id.clone()).or_insert(slot);
                        if def.line_type.is_shout() || non_shout.insert(def.id.as_str()) {
                            entries.push(DirectoryEntry::from_def(def, slot));
                        }
                    }
                }
                slot += 1;
            }
        }

        // A non-shout row that repeats an id already registered as a shout
        // survives the first pass; drop it here.
        let mut seen = HashSet::new();
        entries.retain(|entry| {
            let first = seen.insert(entry.line_id.clone());
            first || entry.line_type.is_shout()
        });

        entries.push(DirectoryEntry::test_line());

        Self {
            entries,
            placeholders,
            order,
            slot_count: slot,
        }
    }

    /// Rows in registration order, the test line last.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn placeholders(&self) -> &[usize] {
        &self.placeholders
    }

    /// Configured slot index of a line id, if it is part of the selection.
    pub fn order_of(&self, line_id: &str) -> Option<usize> {
        self.order.get(line_id).copied()
    }

    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    /// First row registered under `line_id`.
    pub fn lookup(&self, line_id: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|entry| entry.line_id == line_id)
    }

    /// Total configured slots, placeholders included.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(id: &str, line_type: LineType, label: &str) -> LineSlot {
        LineSlot::Line(LineDef::new(id, line_type, label))
    }

    fn ids(directory: &CallDirectory) -> Vec<(&str, LineType)> {
        directory
            .entries()
            .iter()
            .map(|e| (e.line_id.as_str(), e.line_type))
            .collect()
    }

    fn sector() -> Position {
        Position::new("OAK_40_CTR", "Sector 40").with_lines([
            line("100", LineType::Ring, "Tower"),
            LineSlot::Placeholder,
            line("200", LineType::Shout, "Shout A"),
        ])
    }

    #[test]
    fn single_position_with_gap() {
        let directory = CallDirectory::build([&sector()]);

        assert_eq!(
            ids(&directory),
            [
                ("100", LineType::Ring),
                ("200", LineType::Shout),
                (TEST_LINE_ID, LineType::Shout),
            ]
        );
        assert_eq!(directory.placeholders(), [1]);
        assert_eq!(directory.order_of("100"), Some(0));
        assert_eq!(directory.order_of("200"), Some(2));
        assert_eq!(directory.order_of(TEST_LINE_ID), None);
        assert_eq!(directory.slot_count(), 3);
        assert_eq!(directory.lookup("200").unwrap().label, "Shout A");
    }

    #[test]
    fn non_shout_duplicates_keep_first() {
        let a = Position::new("A", "A").with_lines([
            line("100", LineType::Ring, "First"),
            line("300", LineType::Override, "Override"),
        ]);
        let b = Position::new("B", "B").with_lines([
            line("100", LineType::Ring, "Second"),
            line("300", LineType::DialTrunk, "Trunk"),
        ]);

        let directory = CallDirectory::build([&a, &b]);
        assert_eq!(
            ids(&directory),
            [
                ("100", LineType::Ring),
                ("300", LineType::Override),
                (TEST_LINE_ID, LineType::Shout),
            ]
        );
        assert_eq!(directory.lookup("100").map(|e| e.label.as_str()), Some("First"));
        // rejected rows still consume a slot
        assert_eq!(directory.slot_count(), 4);
    }

    #[test]
    fn shout_duplicates_are_preserved_in_order() {
        let a = Position::new("A", "A").with_lines([line("200", LineType::Shout, "Shout A")]);
        let b = Position::new("B", "B").with_lines([
            line("200", LineType::Shout, "Shout B"),
            line("200", LineType::Ring, "Ring 200"),
        ]);

        let directory = CallDirectory::build([&a, &b]);
        let labels: Vec<&str> = directory.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Shout A", "Shout B", TEST_LINE_LABEL]);
    }

    #[test]
    fn placeholder_indices_span_positions() {
        let a = Position::new("A", "A").with_lines([
            LineSlot::Placeholder,
            line("100", LineType::Ring, "x"),
        ]);
        let b = Position::new("B", "B").with_lines([
            line("101", LineType::Ring, "y"),
            LineSlot::Placeholder,
            LineSlot::Placeholder,
        ]);

        let directory = CallDirectory::build([&a, &b]);
        assert_eq!(directory.placeholders(), [0, 3, 4]);
        // placeholders never register
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.order_of("101"), Some(2));
    }

    #[test]
    fn rebuild_is_deterministic() {
        let position = sector();
        assert_eq!(
            CallDirectory::build([&position]),
            CallDirectory::build([&position])
        );
    }

    #[test]
    fn empty_selection_still_has_test_line() {
        let directory = CallDirectory::build(Vec::<&Position>::new());
        assert_eq!(ids(&directory), [(TEST_LINE_ID, LineType::Shout)]);
        assert!(directory.placeholders().is_empty());
        assert!(!directory.has_order());
    }
}
