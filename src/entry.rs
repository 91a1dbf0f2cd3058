//! Page entries: the unit of an editable page sequence.
//!
//! An entry either points at a page of the source document or stands for a
//! blank page to be inserted on export. Entries are immutable; moving one
//! means repositioning it inside a [`PageSequence`](crate::sequence::PageSequence).

use crate::error::{OrganizerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-unique identity of a page entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh [`EntryId`]s. Ids are never reused within a session.
#[derive(Debug, Default)]
pub struct EntryIdGenerator {
    next: u64,
}

impl EntryIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntryId {
        let id = EntryId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Page `original_index` (zero-based) of the source document.
    Original { original_index: usize },
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    id: EntryId,
    kind: EntryKind,
}

impl PageEntry {
    /// Entry for a source page. Fails with `InvalidIndex` unless
    /// `index < source_page_count`.
    pub fn original(id: EntryId, index: usize, source_page_count: usize) -> Result<Self> {
        if index >= source_page_count {
            return Err(OrganizerError::InvalidIndex {
                index,
                page_count: source_page_count,
            });
        }
        Ok(PageEntry {
            id,
            kind: EntryKind::Original {
                original_index: index,
            },
        })
    }

    pub fn blank(id: EntryId) -> Self {
        PageEntry {
            id,
            kind: EntryKind::Blank,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, EntryKind::Blank)
    }

    pub fn original_index(&self) -> Option<usize> {
        match self.kind {
            EntryKind::Original { original_index } => Some(original_index),
            EntryKind::Blank => None,
        }
    }

    /// 1-based page number in the source document, as shown on labels.
    pub fn original_page_number(&self) -> Option<usize> {
        self.original_index().map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_entry_in_range() {
        let mut ids = EntryIdGenerator::new();
        let entry = PageEntry::original(ids.next_id(), 2, 3).unwrap();
        assert_eq!(entry.original_index(), Some(2));
        assert_eq!(entry.original_page_number(), Some(3));
        assert!(!entry.is_blank());
    }

    #[test]
    fn test_original_entry_out_of_range() {
        let mut ids = EntryIdGenerator::new();
        let err = PageEntry::original(ids.next_id(), 3, 3).unwrap_err();
        assert!(matches!(
            err,
            OrganizerError::InvalidIndex { index: 3, page_count: 3 }
        ));

        let err = PageEntry::original(ids.next_id(), 0, 0).unwrap_err();
        assert!(matches!(err, OrganizerError::InvalidIndex { .. }));
    }

    #[test]
    fn test_blank_entry() {
        let mut ids = EntryIdGenerator::new();
        let entry = PageEntry::blank(ids.next_id());
        assert!(entry.is_blank());
        assert_eq!(entry.original_index(), None);
        assert_eq!(entry.kind(), EntryKind::Blank);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = EntryIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(PageEntry::blank(a), PageEntry::blank(a));
        assert_ne!(PageEntry::blank(a), PageEntry::blank(b));
    }
}
