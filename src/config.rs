//! Organizer settings, loadable from a JSON file.

use crate::i18n::Locale;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_OUTPUT_FILE_NAME: &str = "edited_document.pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 in points.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub locale: Locale,
    pub thumbnail_scale: f32,
    pub blank_page: PageSize,
    pub output_file_name: String,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        OrganizerConfig {
            locale: Locale::En,
            thumbnail_scale: DEFAULT_THUMBNAIL_SCALE,
            blank_page: PageSize::A4,
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
        }
    }
}

impl OrganizerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: OrganizerConfig = serde_json::from_str(json).context("Invalid organizer config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.thumbnail_scale.is_finite() || self.thumbnail_scale <= 0.0 {
            bail!("thumbnail_scale must be positive, got {}", self.thumbnail_scale);
        }
        if !(self.blank_page.width > 0.0 && self.blank_page.height > 0.0) {
            bail!(
                "blank_page must have a positive size, got {}x{}",
                self.blank_page.width,
                self.blank_page.height
            );
        }
        if self.output_file_name.trim().is_empty() {
            bail!("output_file_name must not be empty");
        }
        Ok(())
    }
}
