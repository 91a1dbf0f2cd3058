//! Boundaries to the external document services.
//!
//! The reader and the writer each open their own view of the same uploaded
//! bytes. Their page references are distinct associated types, so a page
//! handle from one can never be passed to the other.

use anyhow::Result;
use image::RgbaImage;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable upload buffer shared by both document views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBytes(Arc<[u8]>);

impl SourceBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        SourceBytes(Arc::from(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for SourceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SourceBytes {
    fn from(bytes: Vec<u8>) -> Self {
        SourceBytes::new(bytes)
    }
}

/// Read-only view used to rasterize thumbnails.
pub trait DocumentReader {
    type Handle;
    type PageRef;

    fn parse(&self, bytes: &SourceBytes) -> Result<Self::Handle>;

    fn page_count(&self, handle: &Self::Handle) -> usize;

    /// Page at zero-based `index`.
    fn get_page(&self, handle: &Self::Handle, index: usize) -> Result<Self::PageRef>;

    fn render(&self, page: &Self::PageRef, scale: f32) -> Result<RgbaImage>;
}

/// Write-only view used to assemble the output document.
pub trait DocumentWriter {
    type Source;
    type Document;
    type Page;

    fn open(&self, bytes: &SourceBytes) -> Result<Self::Source>;

    fn source_page_count(&self, source: &Self::Source) -> usize;

    fn create_empty(&self) -> Result<Self::Document>;

    /// Copies the pages at zero-based `indices` from `source` into `doc`.
    /// Handles come back in the order requested.
    fn copy_pages(
        &self,
        doc: &mut Self::Document,
        source: &Self::Source,
        indices: &[usize],
    ) -> Result<Vec<Self::Page>>;

    fn append_page(&self, doc: &mut Self::Document, page: Self::Page) -> Result<()>;

    fn append_blank_page(&self, doc: &mut Self::Document, width_pt: f32, height_pt: f32) -> Result<()>;

    fn serialize(&self, doc: &mut Self::Document) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOptions {
    pub draggable_selector: String,
    pub exclude_selector: String,
    pub animation_ms: u32,
    /// Press delay before a drag starts, applied to touch input only.
    pub touch_delay_ms: u32,
}

impl Default for DragOptions {
    fn default() -> Self {
        DragOptions {
            draggable_selector: ".tile-wrapper".to_string(),
            exclude_selector: "#add-end-btn".to_string(),
            animation_ms: 150,
            touch_delay_ms: 100,
        }
    }
}

/// Gesture engine that lets the user drag tiles into a new order.
///
/// Completion carries no payload: the consumer reads `current_order` itself.
pub trait DragReorderController {
    fn attach(&mut self, options: &DragOptions);

    /// Entry ids in the order currently shown by the controller.
    fn current_order(&self) -> Vec<crate::entry::EntryId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_bytes_shared() {
        let a = SourceBytes::new(b"%PDF-1.7".to_vec());
        let b = a.clone();
        assert_eq!(a.as_slice(), b.as_slice());
        assert!(std::ptr::eq(a.as_slice().as_ptr(), b.as_slice().as_ptr()));
        assert_eq!(&a[..4], b"%PDF");
    }

    #[test]
    fn test_drag_defaults() {
        let options = DragOptions::default();
        assert_eq!(options.draggable_selector, ".tile-wrapper");
        assert_eq!(options.exclude_selector, "#add-end-btn");
        assert_eq!(options.animation_ms, 150);
    }
}
