//! Error types for page organizing sessions.
//!
//! Import failures abort the whole import and leave the session empty.
//! Export failures never touch the edited sequence, so an export can be
//! retried without importing again.

/// Result type alias for organizer operations.
pub type Result<T> = std::result::Result<T, OrganizerError>;

/// Errors raised by the page model, the editor and the pipelines.
#[derive(Debug, thiserror::Error)]
pub enum OrganizerError {
    /// The upload does not declare itself as PDF content.
    #[error("Invalid file type '{content_type}': expected application/pdf")]
    InvalidFileType {
        /// Declared content type of the rejected upload
        content_type: String,
    },

    /// One of the two document views could not be opened.
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    /// A page thumbnail could not be rendered.
    #[error("Failed to render page {page}: {reason}")]
    RenderError {
        /// 1-based page number in the source document
        page: usize,
        /// Reason reported by the reader
        reason: String,
    },

    /// An original page index outside the source document.
    #[error("Invalid page index {index}: document has {page_count} pages")]
    InvalidIndex {
        /// Zero-based index that was requested
        index: usize,
        /// Page count of the source document
        page_count: usize,
    },

    /// A reorder or copy plan that does not match the current entries.
    #[error("Sequence invariant violated: {0}")]
    InvariantViolation(String),

    /// The writer failed to assemble or serialize the output.
    #[error("Export failed: {0}")]
    ExportError(String),

    /// Export was requested with every page deleted.
    #[error("Nothing to export: the page sequence is empty")]
    EmptySequence,

    /// An editing operation was requested before an import completed.
    #[error("No document loaded")]
    NotReady,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrganizerError {
    /// True for the errors that end an import attempt.
    pub fn is_import_failure(&self) -> bool {
        matches!(
            self,
            OrganizerError::InvalidFileType { .. }
                | OrganizerError::ParseError(_)
                | OrganizerError::RenderError { .. }
        )
    }
}
