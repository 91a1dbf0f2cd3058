//! Import pipeline: validate the upload, open both document views, then
//! render one tile per source page in document order.
//!
//! Any failure discards everything built so far; nothing partial escapes.

use crate::config::PDF_MIME_TYPE;
use crate::editor::SequenceEditor;
use crate::error::{OrganizerError, Result};
use crate::i18n::Locale;
use crate::ports::{DocumentReader, DocumentWriter, SourceBytes};
use std::fmt;
use std::path::Path;

/// A file handed over by the user, with the content type it declares.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file, declaring its content type from the extension the way
    /// a browser file picker does.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedFile::new(name, content_type_for_path(path), bytes))
    }
}

/// The upload must declare PDF content.
pub fn validate_upload(file: &UploadedFile) -> Result<()> {
    if file.content_type != PDF_MIME_TYPE {
        return Err(OrganizerError::InvalidFileType {
            content_type: file.content_type.clone(),
        });
    }
    Ok(())
}

pub fn content_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => PDF_MIME_TYPE,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Idle,
    Validating,
    Parsing,
    /// 1-based page currently being rendered.
    Rendering { page: usize, total: usize },
    Ready,
    Failed,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStage::Idle => write!(f, "idle"),
            ImportStage::Validating => write!(f, "validating"),
            ImportStage::Parsing => write!(f, "parsing"),
            ImportStage::Rendering { page, total } => write!(f, "rendering {}/{}", page, total),
            ImportStage::Ready => write!(f, "ready"),
            ImportStage::Failed => write!(f, "failed"),
        }
    }
}

/// Both document views of one upload, kept for the session.
pub struct OriginalDocument<R: DocumentReader, W: DocumentWriter> {
    pub bytes: SourceBytes,
    pub reader_handle: R::Handle,
    pub writer_source: W::Source,
    pub page_count: usize,
}

pub struct ImportPipeline<'a, R: DocumentReader, W: DocumentWriter> {
    reader: &'a R,
    writer: &'a W,
    scale: f32,
    locale: Locale,
}

impl<'a, R: DocumentReader, W: DocumentWriter> ImportPipeline<'a, R, W> {
    pub fn new(reader: &'a R, writer: &'a W, scale: f32, locale: Locale) -> Self {
        ImportPipeline {
            reader,
            writer,
            scale,
            locale,
        }
    }

    /// Runs the import, reporting each stage to `progress`.
    pub fn run(
        &self,
        file: UploadedFile,
        progress: &mut dyn FnMut(ImportStage),
    ) -> Result<(OriginalDocument<R, W>, SequenceEditor)> {
        let result = self.run_stages(file, progress);
        match &result {
            Ok((doc, _)) => {
                log::info!("Imported {} pages", doc.page_count);
                progress(ImportStage::Ready);
            }
            Err(e) => {
                log::error!("Import failed: {}", e);
                progress(ImportStage::Failed);
            }
        }
        result
    }

    fn run_stages(
        &self,
        file: UploadedFile,
        progress: &mut dyn FnMut(ImportStage),
    ) -> Result<(OriginalDocument<R, W>, SequenceEditor)> {
        progress(ImportStage::Validating);
        validate_upload(&file)?;
        log::info!("Importing {} ({} bytes)", file.name, file.bytes.len());

        progress(ImportStage::Parsing);
        let bytes = SourceBytes::new(file.bytes);
        let writer_source = self
            .writer
            .open(&bytes)
            .map_err(|e| OrganizerError::ParseError(format!("{:#}", e)))?;
        let reader_handle = self
            .reader
            .parse(&bytes)
            .map_err(|e| OrganizerError::ParseError(format!("{:#}", e)))?;
        let page_count = self.reader.page_count(&reader_handle);
        if page_count == 0 {
            return Err(OrganizerError::ParseError("document has no pages".into()));
        }
        let writer_pages = self.writer.source_page_count(&writer_source);
        if writer_pages != page_count {
            return Err(OrganizerError::ParseError(format!(
                "document views disagree: reader sees {} pages, writer sees {}",
                page_count, writer_pages
            )));
        }

        let mut editor = SequenceEditor::new(page_count, self.locale);
        for page in 1..=page_count {
            progress(ImportStage::Rendering {
                page,
                total: page_count,
            });
            let render_error = |e: anyhow::Error| OrganizerError::RenderError {
                page,
                reason: format!("{:#}", e),
            };
            let page_ref = self.reader.get_page(&reader_handle, page - 1).map_err(render_error)?;
            let thumbnail = self.reader.render(&page_ref, self.scale).map_err(render_error)?;
            log::debug!(
                "Rendered page {}/{} at {}x{}",
                page,
                page_count,
                thumbnail.width(),
                thumbnail.height()
            );
            editor.append_original(page - 1, thumbnail)?;
        }

        Ok((
            OriginalDocument {
                bytes,
                reader_handle,
                writer_source,
                page_count,
            },
            editor,
        ))
    }
}
