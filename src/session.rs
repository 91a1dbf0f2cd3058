//! Editing session: the context object that ties one upload to its editor.
//!
//! A session starts idle, becomes ready after a successful import and goes
//! back to idle on reset. Every import or reset bumps the generation so work
//! started under an older generation can be recognised as stale.

use crate::config::OrganizerConfig;
use crate::editor::SequenceEditor;
use crate::entry::EntryId;
use crate::error::{OrganizerError, Result};
use crate::export::{ExportPipeline, ExportedFile};
use crate::i18n::Locale;
use crate::import::{validate_upload, ImportPipeline, ImportStage, OriginalDocument, UploadedFile};
use crate::ports::{DocumentReader, DocumentWriter, DragOptions, DragReorderController};
use crate::tile::{Tile, Toolbar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Ready,
}

pub struct Session<R: DocumentReader, W: DocumentWriter> {
    reader: R,
    writer: W,
    config: OrganizerConfig,
    generation: u64,
    document: Option<OriginalDocument<R, W>>,
    editor: SequenceEditor,
}

impl<R: DocumentReader, W: DocumentWriter> Session<R, W> {
    pub fn new(reader: R, writer: W, config: OrganizerConfig) -> Self {
        let editor = SequenceEditor::new(0, config.locale);
        Session {
            reader,
            writer,
            config,
            generation: 0,
            document: None,
            editor,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.document.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    pub fn editor(&self) -> &SequenceEditor {
        &self.editor
    }

    pub fn document(&self) -> Option<&OriginalDocument<R, W>> {
        self.document.as_ref()
    }

    pub fn tiles(&self) -> Vec<&Tile> {
        self.editor.tiles()
    }

    pub fn toolbar(&self) -> Toolbar {
        Toolbar::new(self.config.locale)
    }

    /// Options a host passes to its drag controller for the tile grid.
    pub fn drag_options(&self) -> DragOptions {
        DragOptions::default()
    }

    /// Discards the current document and all entries.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.document = None;
        self.editor = SequenceEditor::new(0, self.config.locale);
        log::info!("Session reset (generation {})", self.generation);
    }

    /// Imports an upload, replacing whatever was loaded. An upload that is
    /// not a PDF is refused without touching the session; any later failure
    /// leaves the session idle and empty.
    pub fn import(&mut self, file: UploadedFile) -> Result<()> {
        self.import_with_progress(file, &mut |stage| log::debug!("Import stage: {}", stage))
    }

    pub fn import_with_progress(
        &mut self,
        file: UploadedFile,
        progress: &mut dyn FnMut(ImportStage),
    ) -> Result<()> {
        if let Err(e) = validate_upload(&file) {
            log::warn!("Upload {} refused: {}", file.name, e);
            return Err(e);
        }
        self.reset();
        let generation = self.generation;
        let pipeline = ImportPipeline::new(
            &self.reader,
            &self.writer,
            self.config.thumbnail_scale,
            self.config.locale,
        );
        let (document, editor) = pipeline.run(file, progress)?;
        self.install(generation, document, editor)
    }

    /// Accepts an import result only if no reset happened since it started.
    pub fn install(
        &mut self,
        generation: u64,
        document: OriginalDocument<R, W>,
        editor: SequenceEditor,
    ) -> Result<()> {
        if generation != self.generation {
            log::warn!(
                "Dropping import from generation {} (current {})",
                generation,
                self.generation
            );
            return Err(OrganizerError::NotReady);
        }
        self.document = Some(document);
        self.editor = editor;
        Ok(())
    }

    /// Attaches `controller` to the tile grid with the session's options.
    pub fn attach_drag(&self, controller: &mut dyn DragReorderController) {
        controller.attach(&self.drag_options());
    }

    pub fn insert_blank(&mut self, before: Option<EntryId>) -> Result<EntryId> {
        self.ensure_ready()?;
        self.editor.insert_blank(before)
    }

    pub fn delete(&mut self, id: EntryId) -> Result<bool> {
        self.ensure_ready()?;
        Ok(self.editor.delete(id))
    }

    pub fn reorder(&mut self, order: &[EntryId]) -> Result<()> {
        self.ensure_ready()?;
        self.editor.reorder(order)
    }

    pub fn move_entry(&mut self, id: EntryId, to: usize) -> Result<()> {
        self.ensure_ready()?;
        self.editor.move_entry(id, to)
    }

    /// Drag completion: re-reads the order from the controller.
    pub fn on_reorder_complete(&mut self, controller: &dyn DragReorderController) -> Result<()> {
        self.reorder(&controller.current_order())
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.config.locale = locale;
        self.editor.set_locale(locale);
    }

    /// Builds the output file. The session is not modified.
    pub fn export(&self) -> Result<ExportedFile> {
        let document = self.document.as_ref().ok_or(OrganizerError::NotReady)?;
        ExportPipeline::new(&self.writer)
            .with_blank_page(self.config.blank_page)
            .with_file_name(self.config.output_file_name.clone())
            .run(self.editor.sequence(), &document.writer_source)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            SessionState::Ready => Ok(()),
            SessionState::Idle => Err(OrganizerError::NotReady),
        }
    }
}
