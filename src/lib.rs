//! # pdfreorg
//!
//! A Rust library for reorganizing the pages of an existing PDF document.
//! This library provides functionality for:
//!
//! - **Import**: Validate an upload, parse it and render one thumbnail tile per page
//! - **Editing**: Delete pages, insert blank A4 pages and reorder pages by drag or by position
//! - **Labels**: Keep every tile label in sync with the current order, in English or Polish
//! - **Export**: Rebuild a new PDF from the edited sequence, copying the original pages intact
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfreorg::config::OrganizerConfig;
//! use pdfreorg::import::UploadedFile;
//! use pdfreorg::pdf::PdfReader;
//! use pdfreorg::session::Session;
//! use pdfreorg::writer::PdfWriter;
//!
//! let mut session = Session::new(PdfReader::new(), PdfWriter::new(), OrganizerConfig::default());
//! session
//!     .import(UploadedFile::from_path("input.pdf").expect("Failed to read input"))
//!     .expect("Failed to import");
//!
//! // Move the last page to the front and append a blank page.
//! let ids = session.editor().sequence().ids();
//! session.move_entry(ids[ids.len() - 1], 1).expect("Failed to move");
//! session.insert_blank(None).expect("Failed to insert");
//!
//! let file = session.export().expect("Failed to export");
//! file.save(&file.file_name).expect("Failed to save");
//! ```
//!
//! ## Modules
//!
//! - [`entry`]: Page entries and their identities
//! - [`sequence`]: The ordered page sequence and its invariants
//! - [`editor`]: Insert, delete, reorder and renumber operations
//! - [`tile`]: Tile view models and the toolbar
//! - [`i18n`]: Localized UI strings
//! - [`ports`]: Reader, writer and drag controller boundaries
//! - [`pdf`]: PDF parsing and thumbnail rendering
//! - [`writer`]: PDF assembly on top of `lopdf`
//! - [`import`] / [`export`]: The two pipelines
//! - [`session`]: One upload and its editor

pub mod compression;
pub mod config;
pub mod editor;
pub mod entry;
pub mod error;
pub mod export;
pub mod i18n;
pub mod import;
pub mod pdf;
pub mod ports;
pub mod sequence;
pub mod session;
pub mod tile;
pub mod writer;

pub use error::{OrganizerError, Result};
pub use session::{Session, SessionState};
