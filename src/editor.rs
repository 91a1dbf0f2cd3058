//! Sequence editing: insert blank, delete, reorder and renumber.
//!
//! The editor owns the page sequence and the tiles bound to it. Every
//! structural change is followed by a full renumber so labels always match
//! the current order.

use crate::entry::{EntryId, EntryIdGenerator, PageEntry};
use crate::error::{OrganizerError, Result};
use crate::i18n::Locale;
use crate::sequence::PageSequence;
use crate::tile::{Tile, TileRenderer};
use image::RgbaImage;
use std::collections::HashMap;

#[derive(Debug)]
pub struct SequenceEditor {
    sequence: PageSequence,
    tiles: HashMap<EntryId, Tile>,
    ids: EntryIdGenerator,
    source_page_count: usize,
    locale: Locale,
}

impl SequenceEditor {
    pub fn new(source_page_count: usize, locale: Locale) -> Self {
        SequenceEditor {
            sequence: PageSequence::new(),
            tiles: HashMap::new(),
            ids: EntryIdGenerator::new(),
            source_page_count,
            locale,
        }
    }

    pub fn sequence(&self) -> &PageSequence {
        &self.sequence
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn tile(&self, id: EntryId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Tiles in sequence order.
    pub fn tiles(&self) -> Vec<&Tile> {
        self.sequence
            .iter()
            .filter_map(|entry| self.tiles.get(&entry.id()))
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.tiles().into_iter().map(|t| t.label.clone()).collect()
    }

    /// Appends the tile for source page `index`. Used while importing.
    pub fn append_original(&mut self, index: usize, thumbnail: RgbaImage) -> Result<EntryId> {
        let entry = PageEntry::original(self.ids.next_id(), index, self.source_page_count)?;
        let id = entry.id();
        let tile = TileRenderer::original(&entry, thumbnail, self.locale);
        self.sequence.push(entry)?;
        self.tiles.insert(id, tile);
        self.renumber();
        Ok(id)
    }

    /// Inserts a blank page before `before`, or at the end.
    pub fn insert_blank(&mut self, before: Option<EntryId>) -> Result<EntryId> {
        let entry = PageEntry::blank(self.ids.next_id());
        let id = entry.id();
        let tile = TileRenderer::blank(&entry, self.locale);
        if before.is_some_and(|b| !self.sequence.contains(b)) {
            log::warn!("Insert reference {:?} is gone, appending blank page at the end", before);
        }
        let index = self.sequence.insert_before(before, entry)?;
        log::debug!("Inserted blank page {} at position {}", id, index + 1);
        self.tiles.insert(id, tile);
        self.renumber();
        Ok(id)
    }

    /// Removes the entry. Deleting an absent entry is a no-op and returns false.
    pub fn delete(&mut self, id: EntryId) -> bool {
        let removed = self.sequence.remove(id).is_some();
        if removed {
            self.tiles.remove(&id);
            log::debug!("Deleted entry {}", id);
        } else {
            log::warn!("Delete of entry {} ignored: not in sequence", id);
        }
        self.renumber();
        removed
    }

    /// Applies the order reported by a drag gesture. The order must be a
    /// permutation of the current entries.
    pub fn reorder(&mut self, order: &[EntryId]) -> Result<()> {
        self.sequence.set_order(order)?;
        self.renumber();
        Ok(())
    }

    /// Moves one entry to 1-based position `to`, as a single drag would.
    pub fn move_entry(&mut self, id: EntryId, to: usize) -> Result<()> {
        let mut order = self.sequence.ids();
        let from = order
            .iter()
            .position(|e| *e == id)
            .ok_or_else(|| OrganizerError::InvariantViolation(format!("entry {} is not part of the sequence", id)))?;
        if to == 0 || to > order.len() {
            return Err(OrganizerError::InvariantViolation(format!(
                "target position {} outside 1..={}",
                to,
                order.len()
            )));
        }
        let moved = order.remove(from);
        order.insert(to - 1, moved);
        self.reorder(&order)
    }

    /// Recomputes every tile label from the current order.
    pub fn renumber(&mut self) {
        for (index, entry) in self.sequence.iter().enumerate() {
            if let Some(tile) = self.tiles.get_mut(&entry.id()) {
                tile.label = TileRenderer::label(entry.kind(), index + 1, self.locale);
            }
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        for tile in self.tiles.values_mut() {
            TileRenderer::relocalize(tile, locale);
        }
        self.renumber();
    }

    /// Drops every entry and tile; the editor is left empty.
    pub fn clear(&mut self) {
        self.sequence.clear();
        self.tiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    fn editor_with(n: usize) -> SequenceEditor {
        let mut editor = SequenceEditor::new(n, Locale::En);
        for i in 0..n {
            editor.append_original(i, RgbaImage::new(1, 1)).unwrap();
        }
        editor
    }

    #[test]
    fn test_initial_labels() {
        let editor = editor_with(3);
        assert_eq!(
            editor.labels(),
            vec!["Page 1 (Orig: 1)", "Page 2 (Orig: 2)", "Page 3 (Orig: 3)"]
        );
    }

    #[test]
    fn test_append_out_of_range() {
        let mut editor = editor_with(2);
        assert!(matches!(
            editor.append_original(2, RgbaImage::new(1, 1)),
            Err(OrganizerError::InvalidIndex { .. })
        ));
        assert_eq!(editor.sequence().len(), 2);
    }

    #[test]
    fn test_insert_blank_before_and_end() {
        let mut editor = editor_with(2);
        let second = editor.sequence().ids()[1];
        editor.insert_blank(Some(second)).unwrap();
        editor.insert_blank(None).unwrap();
        assert_eq!(
            editor.labels(),
            vec![
                "Page 1 (Orig: 1)",
                "Page 2 (Blank)",
                "Page 3 (Orig: 2)",
                "Page 4 (Blank)"
            ]
        );
    }

    #[test]
    fn test_insert_blank_returns_placed_id() {
        let mut editor = editor_with(3);
        let third = editor.sequence().ids()[2];
        let id = editor.insert_blank(Some(third)).unwrap();
        assert_eq!(editor.sequence().position_of(id), Some(2));
        assert_eq!(editor.tile(id).map(|t| t.kind), Some(EntryKind::Blank));

        editor.delete(third);
        let end = editor.insert_blank(Some(third)).unwrap();
        assert_eq!(editor.sequence().ids().last(), Some(&end));
        assert_eq!(editor.tiles().len(), editor.sequence().len());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut editor = editor_with(3);
        let first = editor.sequence().ids()[0];
        assert!(editor.delete(first));
        assert!(!editor.delete(first));
        assert_eq!(editor.labels(), vec!["Page 1 (Orig: 2)", "Page 2 (Orig: 3)"]);
        assert!(editor.tile(first).is_none());
    }

    #[test]
    fn test_delete_everything_is_valid() {
        let mut editor = editor_with(2);
        for id in editor.sequence().ids() {
            editor.delete(id);
        }
        assert!(editor.sequence().is_empty());
        assert!(editor.tiles().is_empty());
        editor.insert_blank(None).unwrap();
        assert_eq!(editor.labels(), vec!["Page 1 (Blank)"]);
    }

    #[test]
    fn test_reorder_stale_order_leaves_sequence() {
        let mut editor = editor_with(3);
        let order = editor.sequence().ids();
        editor.delete(order[1]);
        let before = editor.labels();
        let err = editor.reorder(&[order[2], order[1], order[0]]).unwrap_err();
        assert!(matches!(err, OrganizerError::InvariantViolation(_)));
        assert_eq!(editor.labels(), before);
    }

    #[test]
    fn test_move_entry() {
        let mut editor = editor_with(3);
        let last = editor.sequence().ids()[2];
        editor.move_entry(last, 1).unwrap();
        assert_eq!(
            editor.labels(),
            vec!["Page 1 (Orig: 3)", "Page 2 (Orig: 1)", "Page 3 (Orig: 2)"]
        );
        assert!(editor.move_entry(last, 0).is_err());
        assert!(editor.move_entry(last, 4).is_err());
    }

    #[test]
    fn test_renumber_idempotent() {
        let mut editor = editor_with(4);
        editor.insert_blank(Some(editor.sequence().ids()[2])).unwrap();
        let once = editor.labels();
        editor.renumber();
        assert_eq!(editor.labels(), once);
    }

    #[test]
    fn test_set_locale_relabels() {
        let mut editor = editor_with(1);
        editor.insert_blank(None).unwrap();
        editor.set_locale(Locale::Pl);
        assert_eq!(editor.labels(), vec!["Strona 1 (Oryg: 1)", "Strona 2 (Pusta)"]);
        let kinds: Vec<EntryKind> = editor.tiles().iter().map(|t| t.kind).collect();
        assert_eq!(kinds[1], EntryKind::Blank);
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Delete(usize),
        BlankBefore(usize),
        BlankEnd,
        Move(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..16).prop_map(Op::Delete),
            (0usize..16).prop_map(Op::BlankBefore),
            Just(Op::BlankEnd),
            (0usize..16, 0usize..16).prop_map(|(a, b)| Op::Move(a, b)),
        ]
    }

    /// Applies `op` to both the editor and a plain id list kept alongside it.
    fn apply(editor: &mut SequenceEditor, model: &mut Vec<EntryId>, op: &Op) {
        let len = model.len();
        match *op {
            Op::Delete(i) if len > 0 => {
                let id = model.remove(i % len);
                assert!(editor.delete(id));
            }
            Op::BlankBefore(i) if len > 0 => {
                let at = i % len;
                let id = editor.insert_blank(Some(model[at])).unwrap();
                model.insert(at, id);
            }
            Op::Move(from, to) if len > 0 => {
                let to = to % len + 1;
                let moved = model.remove(from % len);
                model.insert(to - 1, moved);
                editor.move_entry(moved, to).unwrap();
            }
            Op::BlankEnd | Op::Delete(_) | Op::BlankBefore(_) | Op::Move(..) => {
                let id = editor.insert_blank(None).unwrap();
                model.push(id);
            }
        }
    }

    fn loaded(pages: usize) -> (SequenceEditor, Vec<EntryId>) {
        let mut editor = SequenceEditor::new(pages, Locale::En);
        for i in 0..pages {
            editor.append_original(i, RgbaImage::new(1, 1)).unwrap();
        }
        let model = editor.sequence().ids();
        (editor, model)
    }

    proptest! {
        #[test]
        fn sequence_matches_model(pages in 1usize..8, ops in prop::collection::vec(op(), 0..40)) {
            let (mut editor, mut model) = loaded(pages);
            for op in &ops {
                apply(&mut editor, &mut model, op);
                prop_assert_eq!(editor.sequence().ids(), model.clone());
                editor.sequence().check_invariants().unwrap();
            }
        }

        #[test]
        fn labels_follow_order(pages in 1usize..8, ops in prop::collection::vec(op(), 0..40)) {
            let (mut editor, mut model) = loaded(pages);
            for op in &ops {
                apply(&mut editor, &mut model, op);

                let tiles = editor.tiles();
                prop_assert_eq!(tiles.len(), editor.sequence().len());
                for (position, (tile, entry)) in tiles.iter().zip(editor.sequence()).enumerate() {
                    prop_assert_eq!(tile.entry_id, entry.id());
                    prop_assert_eq!(
                        &tile.label,
                        &TileRenderer::label(entry.kind(), position + 1, Locale::En)
                    );
                }
            }
        }

        #[test]
        fn inserts_and_deletes_keep_relative_order(
            pages in 1usize..8,
            ops in prop::collection::vec(op(), 0..40),
        ) {
            let (mut editor, mut model) = loaded(pages);
            for op in ops.iter().filter(|op| !matches!(op, Op::Move(..))) {
                apply(&mut editor, &mut model, op);
            }
            let originals: Vec<usize> = editor
                .sequence()
                .iter()
                .filter_map(|e| e.original_index())
                .collect();
            prop_assert!(originals.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
