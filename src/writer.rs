//! Write-side PDF view backed by `lopdf`.
//!
//! Pages are deep-copied from the uploaded document into a fresh output
//! document. Object ids are remapped on the way in and resources shared by
//! several copied pages are copied once per batch.

use crate::ports::{DocumentWriter, SourceBytes};
use anyhow::{anyhow, bail, Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_PARENT_CHAIN: usize = 64;

pub struct WriterSource {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl WriterSource {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl OutputDocument {
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Writes the collected kids into the page tree root.
    fn finish_page_tree(&mut self) -> Result<()> {
        let kids = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.kids.len() as i64;
        match self.doc.get_object_mut(self.pages_id) {
            Ok(Object::Dictionary(pages)) => {
                pages.set("Kids", Object::Array(kids));
                pages.set("Count", Object::Integer(count));
                Ok(())
            }
            _ => bail!("Output page tree root is missing"),
        }
    }
}

/// Page copied into an [`OutputDocument`] but not yet placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedPage(ObjectId);

#[derive(Debug, Clone, Default)]
pub struct PdfWriter;

impl PdfWriter {
    pub fn new() -> Self {
        PdfWriter
    }
}

impl DocumentWriter for PdfWriter {
    type Source = WriterSource;
    type Document = OutputDocument;
    type Page = CopiedPage;

    fn open(&self, bytes: &SourceBytes) -> Result<WriterSource> {
        let doc = Document::load_mem(bytes).map_err(|e| anyhow!("lopdf could not load document: {}", e))?;
        let pages: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        if pages.is_empty() {
            bail!("Document has no pages");
        }
        Ok(WriterSource { doc, pages })
    }

    fn source_page_count(&self, source: &WriterSource) -> usize {
        source.page_count()
    }

    fn create_empty(&self) -> Result<OutputDocument> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(OutputDocument {
            doc,
            pages_id,
            kids: Vec::new(),
        })
    }

    fn copy_pages(
        &self,
        doc: &mut OutputDocument,
        source: &WriterSource,
        indices: &[usize],
    ) -> Result<Vec<CopiedPage>> {
        let mut map = HashMap::new();
        let mut copied = Vec::with_capacity(indices.len());

        for &index in indices {
            let page_id = *source.pages.get(index).ok_or_else(|| {
                anyhow!(
                    "Page index {} out of range ({} pages)",
                    index,
                    source.pages.len()
                )
            })?;
            let mut page = source
                .doc
                .get_dictionary(page_id)
                .map_err(|e| anyhow!("Page {} is not a dictionary: {}", index + 1, e))?
                .clone();
            page.remove(b"Parent");
            for key in INHERITABLE {
                if !page.has(key) {
                    if let Some(value) = inherited_attribute(&source.doc, page_id, key) {
                        page.set(key, value);
                    }
                }
            }

            let page = import_dict(&source.doc, &mut doc.doc, &page, &mut map)
                .with_context(|| format!("Failed to copy page {}", index + 1))?;
            let new_id = doc.doc.add_object(page);
            log::debug!("Copied source page {} as object {:?}", index + 1, new_id);
            copied.push(CopiedPage(new_id));
        }
        Ok(copied)
    }

    fn append_page(&self, doc: &mut OutputDocument, page: CopiedPage) -> Result<()> {
        let pages_id = doc.pages_id;
        match doc.doc.get_object_mut(page.0) {
            Ok(Object::Dictionary(dict)) => dict.set("Parent", Object::Reference(pages_id)),
            _ => bail!("Copied page {:?} is not in the output document", page.0),
        }
        doc.kids.push(page.0);
        Ok(())
    }

    fn append_blank_page(&self, doc: &mut OutputDocument, width_pt: f32, height_pt: f32) -> Result<()> {
        if !(width_pt > 0.0 && height_pt > 0.0) {
            bail!("Invalid blank page size {}x{}", width_pt, height_pt);
        }
        let content_id = doc.doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(doc.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::from(width_pt),
                    Object::from(height_pt),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]);
        let page_id = doc.doc.add_object(page);
        doc.kids.push(page_id);
        Ok(())
    }

    fn serialize(&self, doc: &mut OutputDocument) -> Result<Vec<u8>> {
        doc.finish_page_tree()?;
        let mut buffer = Vec::new();
        doc.doc
            .save_to(&mut buffer)
            .map_err(|e| anyhow!("Save failed: {}", e))?;
        Ok(buffer)
    }
}

fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_CHAIN {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn is_page_tree_node(doc: &Document, id: ObjectId) -> bool {
    match doc.get_dictionary(id).and_then(|d| d.get(b"Type")) {
        Ok(Object::Name(name)) => name == b"Page" || name == b"Pages",
        _ => false,
    }
}

fn import_dict(
    src: &Document,
    dst: &mut Document,
    dict: &Dictionary,
    map: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut out = Dictionary::new();
    for (key, value) in dict.iter() {
        out.set(key.clone(), import_object(src, dst, value, map)?);
    }
    Ok(out)
}

fn import_object(
    src: &Document,
    dst: &mut Document,
    obj: &Object,
    map: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    Ok(match obj {
        Object::Reference(id) if is_page_tree_node(src, *id) => {
            // Links back into the source page tree would drag the whole
            // source document along.
            log::debug!("Dropping reference to source page tree node {:?}", id);
            Object::Null
        }
        Object::Reference(id) => Object::Reference(import_reference(src, dst, *id, map)?),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| import_object(src, dst, item, map))
                .collect::<Result<Vec<_>>>()?,
        ),
        Object::Dictionary(dict) => Object::Dictionary(import_dict(src, dst, dict, map)?),
        Object::Stream(stream) => {
            let mut copy = stream.clone();
            copy.dict = import_dict(src, dst, &stream.dict, map)?;
            Object::Stream(copy)
        }
        other => other.clone(),
    })
}

fn import_reference(
    src: &Document,
    dst: &mut Document,
    id: ObjectId,
    map: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    if let Some(new_id) = map.get(&id) {
        return Ok(*new_id);
    }
    let new_id = dst.new_object_id();
    // Registered before recursing so reference cycles terminate.
    map.insert(id, new_id);
    let imported = match src.get_object(id) {
        Ok(obj) => import_object(src, dst, obj, map)?,
        Err(_) => {
            log::warn!("Source object {:?} is missing, copying as null", id);
            Object::Null
        }
    };
    dst.objects.insert(new_id, imported);
    Ok(new_id)
}
