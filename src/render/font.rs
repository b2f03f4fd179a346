//! Font management using cosmic-text.
//!
//! Wraps a cosmic-text `FontSystem` for shaping and measurement plus a
//! `SwashCache` for glyph rasterization, and maps CSS-style family names
//! (`sans-serif`, `monospace`, `Arial`) onto fontdb families.

use std::path::Path;

use cosmic_text::{fontdb, Attrs, AttrsOwned, Buffer, Family, Metrics, Shaping};

use super::measure::TextMetrics;
use crate::error::Result;
use crate::style::FontSpec;

/// Owns the font database used for text shaping and rasterization.
pub struct FontBook {
    pub font_system: cosmic_text::FontSystem,
    pub swash_cache: cosmic_text::SwashCache,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.font_system.db().len())
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBook {
    /// Font book backed by the installed system fonts.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} system font faces", db.len());
        Self::from_db(db)
    }

    /// Font book with no fonts at all. Text measures as zero width and draws nothing.
    pub fn empty() -> Self {
        Self::from_db(fontdb::Database::new())
    }

    /// System fonts plus the given font files.
    ///
    /// Unreadable files are logged and skipped.
    pub fn with_font_files<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for path in paths {
            let path = path.as_ref();
            match std::fs::read(path) {
                Ok(data) => {
                    db.load_font_data(data);
                    tracing::debug!("Loaded font {}", path.display());
                }
                Err(e) => tracing::warn!("Failed to read font {}: {}", path.display(), e),
            }
        }
        Self::from_db(db)
    }

    fn from_db(db: fontdb::Database) -> Self {
        Self {
            font_system: cosmic_text::FontSystem::new_with_locale_and_db("en-US".to_string(), db),
            swash_cache: cosmic_text::SwashCache::new(),
        }
    }

    /// Another book over the faces already loaded here, without rescanning
    /// the system. Shaping state and glyph caches start empty.
    pub fn fork(&self) -> Self {
        Self::from_db(self.font_system.db().clone())
    }

    /// Load one more font file into the database.
    pub fn load_font_file(&mut self, path: &Path) -> Result<()> {
        let data = std::fs::read(path)?;
        self.font_system.db_mut().load_font_data(data);
        Ok(())
    }

    /// Owned attributes for a font descriptor.
    ///
    /// `AttrsOwned` does not borrow the family name, so it can be held across
    /// calls that take `&mut font_system`.
    pub fn attrs_owned(font: &FontSpec) -> AttrsOwned {
        AttrsOwned::new(&Attrs::new().family(css_family(&font.family)))
    }

    /// Whether any font face is loaded. Shaping without one is not possible.
    pub fn has_fonts(&self) -> bool {
        self.font_system.db().len() > 0
    }

    /// Shape `text` into a buffer. `width: None` lays it out on one line.
    ///
    /// Callers must check [`has_fonts`](Self::has_fonts) first.
    pub fn shape(
        &mut self,
        text: &str,
        font: &FontSpec,
        line_height: f32,
        width: Option<f32>,
    ) -> Buffer {
        let metrics = Metrics::new(font.size_px, line_height.max(1.0));
        let attrs = Self::attrs_owned(font);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, width, None);
        buffer.set_text(
            &mut self.font_system,
            text,
            &attrs.as_attrs(),
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, true);
        buffer
    }
}

impl TextMetrics for FontBook {
    fn line_width(&mut self, text: &str, font: &FontSpec) -> f32 {
        if !self.has_fonts() || text.is_empty() {
            return 0.0;
        }
        let buffer = self.shape(text, font, font.line_height(), None);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0_f32, f32::max)
    }
}

/// Map a CSS family name to a fontdb family.
fn css_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "sans-serif" | "system-ui" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_families_map_to_fontdb() {
        assert_eq!(css_family("sans-serif"), Family::SansSerif);
        assert_eq!(css_family("Monospace"), Family::Monospace);
        assert_eq!(css_family("Arial"), Family::Name("Arial"));
    }

    #[test]
    fn fork_shares_loaded_faces() {
        let book = FontBook::new();
        let fork = book.fork();
        assert_eq!(fork.font_system.db().len(), book.font_system.db().len());
        assert_eq!(fork.has_fonts(), book.has_fonts());
    }

    #[test]
    fn empty_book_measures_nothing() {
        let mut book = FontBook::empty();
        let w = book.line_width("Hello", &FontSpec::default());
        assert_eq!(w, 0.0);
    }

    #[test]
    fn system_fonts_measure_monotonically() {
        let mut book = FontBook::new();
        let font = FontSpec::default();
        let short = book.line_width("Hi", &font);
        let long = book.line_width("Hi there, how are you?", &font);
        // Hosts without fonts measure both as zero.
        assert!(long >= short);
    }
}
