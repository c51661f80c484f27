//! Error types for glyphrun
//!
//! An unrenderable character is never an error here: the segmenter drops
//! it and keeps scanning. Errors are reserved for genuinely broken
//! inputs, a font file that does not parse or a shaping backend that
//! rejects its font resource.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlyphRunError>;

/// Main error type for glyphrun
#[derive(Debug, Error)]
pub enum GlyphRunError {
    #[error("font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("shaping failed: {0}")]
    Shaping(#[from] ShapingError),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("font file not found: {0}")]
    FileNotFound(String),

    #[error("invalid font data")]
    InvalidData,
}

/// Shaping backend errors.
///
/// These indicate a corrupt or unusable font resource and propagate to
/// the caller; they are never produced for ordinary text content.
#[derive(Debug, Error)]
pub enum ShapingError {
    #[error("font has no usable glyph data")]
    InvalidFont,

    #[error("empty shaping window")]
    EmptyWindow,

    #[error("backend error: {0}")]
    Backend(String),
}
