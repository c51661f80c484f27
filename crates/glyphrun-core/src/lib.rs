//! Glyphrun Core: the types that travel between segmentation and shaping
//!
//! A run of text enters as UTF-16 code units and leaves as a list of
//! segments, each carrying positioned glyphs and a resolved font. This
//! crate holds the value types and the two capability traits that make
//! the engine pluggable:
//!
//! - [`traits::FontMatcher`] - the system font-matching capability
//! - [`traits::Shaper`] - the glyph-shaping capability
//!
//! Both are injected into the engine as trait objects, so the segmenter
//! can be exercised against fakes in tests and against HarfBuzz and a
//! real font database in production.

pub mod error;
pub mod traits;

pub use error::{GlyphRunError, Result};
pub use traits::{FontMatcher, FontRef, Shaper};

/// The data structures that flow through the engine
pub mod types {
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Unique identifier for a glyph within a font
    pub type GlyphId = u32;

    /// Stable identity of a loaded font face, for per-font memoization
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FontId(pub u64);

    /// Opaque non-owning handle to the text element that owns a run.
    ///
    /// Segments carry this back-reference instead of a real reference so
    /// they never extend the lifetime of their owner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ElementId(u64);

    static NEXT_ELEMENT: AtomicU64 = AtomicU64::new(1);

    impl ElementId {
        /// Mint a fresh, process-unique element handle.
        pub fn next() -> Self {
            Self(NEXT_ELEMENT.fetch_add(1, Ordering::Relaxed))
        }
    }

    /// Which way a shaped segment flows
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FlowDirection {
        LeftToRight,
        RightToLeft,
    }

    /// One shaped glyph in the text's logical units.
    ///
    /// `cluster` is the UTF-16 code-unit offset into the full run text
    /// that produced this glyph, used for hit-testing and caret
    /// placement downstream.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GlyphInfo {
        pub glyph_id: u16,
        pub cluster: usize,
        pub advance: f32,
        pub offset_x: f32,
        pub offset_y: f32,
    }

    /// One glyph record as reported by a shaping backend.
    ///
    /// Positions are in the font's design units; the engine scales them
    /// into logical units when it assembles [`GlyphInfo`] values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShapedGlyph {
        pub glyph_id: GlyphId,
        /// Offset into the shaped window, in UTF-16 code units.
        pub cluster: u32,
        pub x_advance: i32,
        pub x_offset: i32,
        pub y_offset: i32,
    }

    /// What a shaping backend returns for one window of text
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ShapeOutput {
        pub glyphs: Vec<ShapedGlyph>,
        /// The direction the backend detected for the window.
        pub direction: FlowDirection,
    }

    /// An OpenType feature request passed through to the shaping backend
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShapingFeature {
        pub tag: [u8; 4],
        pub value: u32,
    }

    impl ShapingFeature {
        pub const fn new(tag: [u8; 4], value: u32) -> Self {
            Self { tag, value }
        }
    }

    /// Numeric font weight, 100..=900 in CSS-style steps
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FontWeight(pub u16);

    impl FontWeight {
        pub const NORMAL: Self = Self(400);
        pub const BOLD: Self = Self(700);
    }

    impl Default for FontWeight {
        fn default() -> Self {
            Self::NORMAL
        }
    }

    /// Horizontal compression or expansion of a face
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum FontStretch {
        Condensed,
        SemiCondensed,
        #[default]
        Normal,
        SemiExpanded,
        Expanded,
    }

    /// Slant of a face
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum FontStyle {
        #[default]
        Normal,
        Italic,
        Oblique,
    }

    /// What the owning element asked for: family plus the parameters
    /// that select and scale a concrete face.
    #[derive(Debug, Clone, PartialEq)]
    pub struct FontRequest {
        pub family: String,
        /// Absolute size in logical units.
        pub size: f32,
        pub weight: FontWeight,
        pub stretch: FontStretch,
        pub style: FontStyle,
        /// Extra horizontal scale applied on top of `size` when
        /// converting advances out of design units.
        pub horizontal_scale: f32,
    }

    impl FontRequest {
        pub fn new(family: impl Into<String>, size: f32) -> Self {
            Self {
                family: family.into(),
                size,
                weight: FontWeight::default(),
                stretch: FontStretch::default(),
                style: FontStyle::default(),
                horizontal_scale: 1.0,
            }
        }
    }

    impl Default for FontRequest {
        fn default() -> Self {
            Self::new("sans-serif", 16.0)
        }
    }

}
