//! Localized user-visible strings.
//!
//! Lookups are a pure function of key and locale. Only the tile and toolbar
//! rendering calls into this module; the page model never does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Pl,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pl];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pl => "pl",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "pl" => Ok(Locale::Pl),
            other => Err(format!("Unsupported locale '{}'. Valid options: en, pl", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    AppTitle,
    AppSubtitle,
    SelectPdf,
    DragDrop,
    Processing,
    NewPdf,
    SaveDownload,
    AddPage,
    Page,
    Blank,
    Orig,
    BlankPlaceholder,
    InsertTitle,
    AddEndTitle,
    AlertValid,
    AlertError,
}

impl TextKey {
    pub const ALL: [TextKey; 16] = [
        TextKey::AppTitle,
        TextKey::AppSubtitle,
        TextKey::SelectPdf,
        TextKey::DragDrop,
        TextKey::Processing,
        TextKey::NewPdf,
        TextKey::SaveDownload,
        TextKey::AddPage,
        TextKey::Page,
        TextKey::Blank,
        TextKey::Orig,
        TextKey::BlankPlaceholder,
        TextKey::InsertTitle,
        TextKey::AddEndTitle,
        TextKey::AlertValid,
        TextKey::AlertError,
    ];

    /// Stable identifier used in string dumps.
    pub fn name(self) -> &'static str {
        match self {
            TextKey::AppTitle => "appTitle",
            TextKey::AppSubtitle => "appSubtitle",
            TextKey::SelectPdf => "selectPdf",
            TextKey::DragDrop => "dragDrop",
            TextKey::Processing => "processing",
            TextKey::NewPdf => "newPdf",
            TextKey::SaveDownload => "saveDownload",
            TextKey::AddPage => "addPage",
            TextKey::Page => "page",
            TextKey::Blank => "blank",
            TextKey::Orig => "orig",
            TextKey::BlankPlaceholder => "blankPlaceholder",
            TextKey::InsertTitle => "insertTitle",
            TextKey::AddEndTitle => "addEndTitle",
            TextKey::AlertValid => "alertValid",
            TextKey::AlertError => "alertError",
        }
    }
}

pub fn localize(key: TextKey, locale: Locale) -> &'static str {
    match locale {
        Locale::En => english(key),
        Locale::Pl => polish(key),
    }
}

fn english(key: TextKey) -> &'static str {
    match key {
        TextKey::AppTitle => "PDF Organizer",
        TextKey::AppSubtitle => "Drag to reorder. Tap + to insert pages.",
        TextKey::SelectPdf => "Select PDF file",
        TextKey::DragDrop => "Drag & drop or click to upload",
        TextKey::Processing => "Processing pages...",
        TextKey::NewPdf => "Start Over",
        TextKey::SaveDownload => "Save & Download PDF",
        TextKey::AddPage => "Add Page",
        TextKey::Page => "Page",
        TextKey::Blank => "Blank",
        TextKey::Orig => "Orig",
        TextKey::BlankPlaceholder => "(Blank A4)",
        TextKey::InsertTitle => "Insert Blank Page Here",
        TextKey::AddEndTitle => "Add page at the end",
        TextKey::AlertValid => "Please upload a valid PDF file.",
        TextKey::AlertError => "Error reading PDF. Check console.",
    }
}

fn polish(key: TextKey) -> &'static str {
    match key {
        TextKey::AppTitle => "Organizer PDF",
        TextKey::AppSubtitle => "Przeciągnij, aby zmienić kolejność. Kliknij +, aby dodać strony.",
        TextKey::SelectPdf => "Wybierz plik PDF",
        TextKey::DragDrop => "Przeciągnij i upuść lub kliknij",
        TextKey::Processing => "Przetwarzanie stron...",
        TextKey::NewPdf => "Zacznij od nowa",
        TextKey::SaveDownload => "Zapisz i pobierz PDF",
        TextKey::AddPage => "Dodaj stronę",
        TextKey::Page => "Strona",
        TextKey::Blank => "Pusta",
        TextKey::Orig => "Oryg",
        TextKey::BlankPlaceholder => "(Pusta A4)",
        TextKey::InsertTitle => "Wstaw pustą stronę tutaj",
        TextKey::AddEndTitle => "Dodaj stronę na końcu",
        TextKey::AlertValid => "Proszę wgrać poprawny plik PDF.",
        TextKey::AlertError => "Błąd odczytu PDF. Sprawdź konsolę.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localize() {
        assert_eq!(localize(TextKey::Page, Locale::En), "Page");
        assert_eq!(localize(TextKey::Page, Locale::Pl), "Strona");
        assert_eq!(localize(TextKey::BlankPlaceholder, Locale::Pl), "(Pusta A4)");
    }

    #[test]
    fn test_every_key_translated() {
        for locale in Locale::ALL {
            for key in TextKey::ALL {
                assert!(!localize(key, locale).is_empty(), "{} missing for {}", key.name(), locale);
            }
        }
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("PL".parse::<Locale>().unwrap(), Locale::Pl);
        assert_eq!(" en ".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }
}
