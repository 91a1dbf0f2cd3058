//! Export pipeline: replays the edited sequence against the writer.
//!
//! Original pages are copied in one batch (the copy plan), then the sequence
//! is walked again and each original entry consumes the next copied page in
//! order while blank entries get a fresh page of the configured size.

use crate::config::{PageSize, DEFAULT_OUTPUT_FILE_NAME, PDF_MIME_TYPE};
use crate::entry::EntryKind;
use crate::error::{OrganizerError, Result};
use crate::ports::DocumentWriter;
use crate::sequence::PageSequence;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Serialized output ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Source page indices of the original entries, in sequence order.
/// A page listed twice is refused.
pub fn copy_plan(sequence: &PageSequence) -> Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();
    for entry in sequence {
        if let Some(index) = entry.original_index() {
            if !seen.insert(index) {
                return Err(OrganizerError::InvariantViolation(format!(
                    "original page {} appears more than once",
                    index + 1
                )));
            }
            plan.push(index);
        }
    }
    Ok(plan)
}

pub struct ExportPipeline<'a, W: DocumentWriter> {
    writer: &'a W,
    blank_page: PageSize,
    file_name: String,
}

impl<'a, W: DocumentWriter> ExportPipeline<'a, W> {
    pub fn new(writer: &'a W) -> Self {
        ExportPipeline {
            writer,
            blank_page: PageSize::A4,
            file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
        }
    }

    pub fn with_blank_page(mut self, size: PageSize) -> Self {
        self.blank_page = size;
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Builds the output document. Reads the sequence only.
    pub fn run(&self, sequence: &PageSequence, source: &W::Source) -> Result<ExportedFile> {
        if sequence.is_empty() {
            return Err(OrganizerError::EmptySequence);
        }
        let plan = copy_plan(sequence)?;
        let export_error = |e: anyhow::Error| OrganizerError::ExportError(format!("{:#}", e));

        let mut doc = self.writer.create_empty().map_err(export_error)?;
        let copied = if plan.is_empty() {
            Vec::new()
        } else {
            self.writer.copy_pages(&mut doc, source, &plan).map_err(export_error)?
        };
        if copied.len() != plan.len() {
            return Err(OrganizerError::ExportError(format!(
                "writer returned {} pages for a copy plan of {}",
                copied.len(),
                plan.len()
            )));
        }

        let mut copied = copied.into_iter();
        for entry in sequence {
            match entry.kind() {
                EntryKind::Original { original_index } => {
                    let page = copied.next().ok_or_else(|| {
                        OrganizerError::ExportError(format!(
                            "no copied page left for original page {}",
                            original_index + 1
                        ))
                    })?;
                    self.writer.append_page(&mut doc, page).map_err(export_error)?;
                }
                EntryKind::Blank => {
                    self.writer
                        .append_blank_page(&mut doc, self.blank_page.width, self.blank_page.height)
                        .map_err(export_error)?;
                }
            }
        }

        let bytes = self.writer.serialize(&mut doc).map_err(export_error)?;
        log::info!(
            "Exported {} pages ({} copied, {} blank) as {} ({} bytes)",
            sequence.len(),
            plan.len(),
            sequence.len() - plan.len(),
            self.file_name,
            bytes.len()
        );
        Ok(ExportedFile {
            file_name: self.file_name.clone(),
            mime_type: PDF_MIME_TYPE.to_string(),
            bytes,
        })
    }
}
