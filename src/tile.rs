//! Tile rendering: maps page entries onto display values.
//!
//! A [`Tile`] is what a host draws for one entry: a thumbnail or a blank
//! placeholder, a page label and the tooltip of its insert-before control.
//! No editing logic lives here.

use crate::entry::{EntryId, EntryKind, PageEntry};
use crate::i18n::{localize, Locale, TextKey};
use image::RgbaImage;

#[derive(Debug, Clone)]
pub enum TileContent {
    Thumbnail(RgbaImage),
    BlankPlaceholder(String),
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub entry_id: EntryId,
    pub kind: EntryKind,
    pub label: String,
    pub content: TileContent,
    pub insert_title: String,
}

impl Tile {
    pub fn thumbnail(&self) -> Option<&RgbaImage> {
        match &self.content {
            TileContent::Thumbnail(image) => Some(image),
            TileContent::BlankPlaceholder(_) => None,
        }
    }
}

pub struct TileRenderer;

impl TileRenderer {
    /// Tile for a source page. The label stays empty until the next renumber.
    pub fn original(entry: &PageEntry, thumbnail: RgbaImage, locale: Locale) -> Tile {
        Tile {
            entry_id: entry.id(),
            kind: entry.kind(),
            label: String::new(),
            content: TileContent::Thumbnail(thumbnail),
            insert_title: localize(TextKey::InsertTitle, locale).to_string(),
        }
    }

    pub fn blank(entry: &PageEntry, locale: Locale) -> Tile {
        Tile {
            entry_id: entry.id(),
            kind: entry.kind(),
            label: String::new(),
            content: TileContent::BlankPlaceholder(
                localize(TextKey::BlankPlaceholder, locale).to_string(),
            ),
            insert_title: localize(TextKey::InsertTitle, locale).to_string(),
        }
    }

    /// Label for an entry at 1-based `position`.
    pub fn label(kind: EntryKind, position: usize, locale: Locale) -> String {
        let page = localize(TextKey::Page, locale);
        match kind {
            EntryKind::Blank => format!("{} {} ({})", page, position, localize(TextKey::Blank, locale)),
            EntryKind::Original { original_index } => format!(
                "{} {} ({}: {})",
                page,
                position,
                localize(TextKey::Orig, locale),
                original_index + 1
            ),
        }
    }

    /// Re-applies locale-dependent text except the label.
    pub fn relocalize(tile: &mut Tile, locale: Locale) {
        tile.insert_title = localize(TextKey::InsertTitle, locale).to_string();
        if let TileContent::BlankPlaceholder(text) = &mut tile.content {
            *text = localize(TextKey::BlankPlaceholder, locale).to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub caption: String,
    pub title: Option<String>,
}

/// Session-wide controls exposed next to the tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    pub start_over: Control,
    pub save_download: Control,
    pub add_page: Control,
}

impl Toolbar {
    pub fn new(locale: Locale) -> Self {
        Toolbar {
            start_over: Control {
                caption: localize(TextKey::NewPdf, locale).to_string(),
                title: None,
            },
            save_download: Control {
                caption: localize(TextKey::SaveDownload, locale).to_string(),
                title: None,
            },
            add_page: Control {
                caption: localize(TextKey::AddPage, locale).to_string(),
                title: Some(localize(TextKey::AddEndTitle, locale).to_string()),
            },
        }
    }
}
