//! Font loading and matching for glyphrun
//!
//! Fonts store their raw data and answer the two questions the
//! segmentation engine asks on its hot path: "do you cover this
//! codepoint" and "what is your design-unit scale". The
//! [`FontDatabase`] doubles as the in-process stand-in for the
//! platform's font-matching capability: registration order defines
//! fallback preference, and [`DatabaseFontMatcher`] probes registered
//! faces for coverage.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use read_fonts::{FontRef as ReadFontRef, TableProvider};
use skrifa::string::StringId;
use skrifa::MetadataProvider;

use glyphrun_core::{
    error::{FontLoadError, Result},
    traits::{FontMatcher, FontRef},
    types::{FontId, GlyphId},
};

pub mod details;
pub mod fallback;

pub use details::{FontDetails, FontDetailsCache, FontKey};
pub use fallback::FallbackResolver;

/// A font face that's been brought into memory, ready to query and shape.
///
/// Stores the raw font data; parsing views are created on demand. For
/// TTC collections, `index` selects the face.
pub struct Font {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    family: String,
    id: FontId,
}

impl Font {
    /// Opens a font file from disk and makes it usable
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_index(path, 0)
    }

    /// Opens a specific face from a font file (for TTC collections)
    pub fn from_file_index(path: impl AsRef<Path>, index: u32) -> Result<Self> {
        let data = fs::read(path.as_ref())
            .map_err(|_| FontLoadError::FileNotFound(path.as_ref().display().to_string()))?;
        Self::from_data_index(data, index)
    }

    /// Turns raw font bytes into something we can work with
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    /// Turns raw font bytes into a specific face (for TTC collections)
    pub fn from_data_index(data: Vec<u8>, index: u32) -> Result<Self> {
        // Validate the data by attempting to parse it
        let font_ref =
            ReadFontRef::from_index(&data, index).map_err(|_| FontLoadError::InvalidData)?;

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .unwrap_or(1000);

        let family = skrifa::FontRef::from_index(&data, index)
            .ok()
            .and_then(|font| {
                font.localized_strings(StringId::FAMILY_NAME)
                    .english_or_first()
                    .map(|name| name.to_string())
            })
            .unwrap_or_default();

        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        index.hash(&mut hasher);
        let id = FontId(hasher.finish());

        Ok(Font {
            data,
            index,
            units_per_em,
            family,
            id,
        })
    }

    fn font_ref(&self) -> Option<ReadFontRef<'_>> {
        ReadFontRef::from_index(&self.data, self.index).ok()
    }

    /// Finds which glyph draws this codepoint, if any
    pub fn glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        self.font_ref().and_then(|font| {
            font.cmap()
                .ok()?
                .map_codepoint(codepoint)
                .map(|gid| gid.to_u32())
        })
    }
}

impl FontRef for Font {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn family_name(&self) -> &str {
        &self.family
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        self.glyph_id(codepoint)
    }

    fn id(&self) -> FontId {
        self.id
    }
}

/// Registry of loaded faces. Registration order is fallback preference
/// order: the first registered face covering a codepoint wins.
pub struct FontDatabase {
    fonts: Vec<Arc<Font>>,
    /// Prevents loading the same font file twice.
    path_cache: HashMap<PathBuf, Arc<Font>>,
}

impl FontDatabase {
    /// Starts with an empty registry
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            path_cache: HashMap::new(),
        }
    }

    /// Loads a font file and remembers it. If the same path was already
    /// loaded, returns the cached face instead of re-reading the file.
    pub fn load_font(&mut self, path: impl AsRef<Path>) -> Result<Arc<Font>> {
        let path = path.as_ref();
        let cache_key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(font) = self.path_cache.get(&cache_key) {
            return Ok(font.clone());
        }

        let font = Arc::new(Font::from_file(path)?);
        self.path_cache.insert(cache_key, font.clone());
        self.fonts.push(font.clone());
        Ok(font)
    }

    /// Registers a face from memory
    pub fn load_font_data(&mut self, data: Vec<u8>) -> Result<Arc<Font>> {
        let font = Arc::new(Font::from_data(data)?);
        self.fonts.push(font.clone());
        Ok(font)
    }

    /// All registered faces, in preference order
    pub fn fonts(&self) -> &[Arc<Font>] {
        &self.fonts
    }

    /// Looks up a face by family name, case-insensitively
    pub fn find_family(&self, family: &str) -> Option<Arc<Font>> {
        self.fonts
            .iter()
            .find(|font| font.family.eq_ignore_ascii_case(family))
            .cloned()
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }
}

impl Default for FontDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process implementation of the platform font-matching capability:
/// probe registered faces in preference order for coverage.
pub struct DatabaseFontMatcher {
    db: Arc<FontDatabase>,
}

impl DatabaseFontMatcher {
    pub fn new(db: Arc<FontDatabase>) -> Self {
        Self { db }
    }
}

impl FontMatcher for DatabaseFontMatcher {
    fn match_character(&self, codepoint: u32) -> Option<Arc<dyn FontRef>> {
        self.db
            .fonts()
            .iter()
            .find(|font| font.covers(codepoint))
            .map(|font| font.clone() as Arc<dyn FontRef>)
    }
}
