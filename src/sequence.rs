//! The ordered page sequence. Its order is the output page order.

use crate::entry::{EntryId, PageEntry};
use crate::error::{OrganizerError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSequence {
    entries: Vec<PageEntry>,
}

impl PageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(PageEntry::id).collect()
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.position_of(id).is_some()
    }

    pub fn get(&self, id: EntryId) -> Option<&PageEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Zero-based index of the entry in the current order.
    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// 1-based rank of the entry, derived from the current order.
    pub fn display_position(&self, id: EntryId) -> Option<usize> {
        self.position_of(id).map(|p| p + 1)
    }

    /// Entry at a 1-based display position.
    pub fn at_display_position(&self, position: usize) -> Option<&PageEntry> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub(crate) fn push(&mut self, entry: PageEntry) -> Result<()> {
        self.check_insertable(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Inserts before `before`, or at the end when `before` is `None` or no
    /// longer present. Returns the zero-based index used.
    pub(crate) fn insert_before(&mut self, before: Option<EntryId>, entry: PageEntry) -> Result<usize> {
        self.check_insertable(&entry)?;
        let index = before
            .and_then(|id| self.position_of(id))
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
        Ok(index)
    }

    pub(crate) fn remove(&mut self, id: EntryId) -> Option<PageEntry> {
        let index = self.position_of(id)?;
        Some(self.entries.remove(index))
    }

    /// Replaces the order with `order`, which must name every current entry
    /// exactly once. On failure the sequence is left unchanged.
    pub(crate) fn set_order(&mut self, order: &[EntryId]) -> Result<()> {
        if order.len() != self.entries.len() {
            return Err(OrganizerError::InvariantViolation(format!(
                "reorder names {} entries but the sequence holds {}",
                order.len(),
                self.entries.len()
            )));
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !seen.insert(*id) {
                return Err(OrganizerError::InvariantViolation(format!(
                    "entry {} appears more than once in reorder",
                    id
                )));
            }
            if !self.contains(*id) {
                return Err(OrganizerError::InvariantViolation(format!(
                    "entry {} is not part of the sequence",
                    id
                )));
            }
        }

        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            if let Some(entry) = self.get(*id) {
                reordered.push(entry.clone());
            }
        }
        self.entries = reordered;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Ids unique, each source page referenced at most once.
    pub fn check_invariants(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut originals = HashSet::new();
        for entry in &self.entries {
            if !ids.insert(entry.id()) {
                return Err(OrganizerError::InvariantViolation(format!(
                    "duplicate entry {}",
                    entry.id()
                )));
            }
            if let Some(index) = entry.original_index() {
                if !originals.insert(index) {
                    return Err(OrganizerError::InvariantViolation(format!(
                        "original page {} appears more than once",
                        index + 1
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_insertable(&self, entry: &PageEntry) -> Result<()> {
        if self.contains(entry.id()) {
            return Err(OrganizerError::InvariantViolation(format!(
                "entry {} is already in the sequence",
                entry.id()
            )));
        }
        if let Some(index) = entry.original_index() {
            if self.entries.iter().any(|e| e.original_index() == Some(index)) {
                return Err(OrganizerError::InvariantViolation(format!(
                    "original page {} is already in the sequence",
                    index + 1
                )));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PageSequence {
    type Item = &'a PageEntry;
    type IntoIter = std::slice::Iter<'a, PageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
