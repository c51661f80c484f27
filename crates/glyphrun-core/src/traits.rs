//! The capability seams of the segmentation engine
//!
//! Three traits, one job each:
//!
//! - [`FontRef`] - a loaded font face: raw bytes, coverage, metrics
//! - [`FontMatcher`] - the platform's "which installed face can draw
//!   this codepoint" capability
//! - [`Shaper`] - the platform's glyph-shaping capability
//!
//! The segmenter only ever talks to these traits, which keeps it
//! implementable and testable against fakes.

use crate::error::ShapingError;
use crate::types::{FontId, GlyphId, ShapeOutput, ShapingFeature};
use std::sync::Arc;

/// A loaded font face the engine can query and shape with.
///
/// Implementations are expected to be cheap to query: `glyph_id` backs
/// the per-character coverage test on the segmentation hot path.
pub trait FontRef: Send + Sync {
    /// Raw font bytes as they live in the file
    fn data(&self) -> &[u8];

    /// Face index within a collection (0 for single-face files)
    fn index(&self) -> u32 {
        0
    }

    /// The face's family name, used as part of the fallback cache key
    fn family_name(&self) -> &str;

    /// The font's internal coordinate system scale
    fn units_per_em(&self) -> u16;

    /// Find the glyph that represents this codepoint.
    ///
    /// Returns `None` when the font's character map has no entry for it.
    /// The codepoint may be outside the Basic Multilingual Plane.
    fn glyph_id(&self, codepoint: u32) -> Option<GlyphId>;

    /// Does this face cover the codepoint at all?
    fn covers(&self, codepoint: u32) -> bool {
        self.glyph_id(codepoint).is_some()
    }

    /// Stable identity of this face, for per-font memoization
    fn id(&self) -> FontId;
}

/// The system font-matching capability.
///
/// Given a codepoint the primary font cannot draw, find the best
/// installed face that can, or report that none exists.
pub trait FontMatcher: Send + Sync {
    fn match_character(&self, codepoint: u32) -> Option<Arc<dyn FontRef>>;

    /// Whether faces produced by this matcher may still change after
    /// being handed out (asynchronous font loading). Engines use this to
    /// decide whether to subscribe for font-loaded notifications.
    fn faces_can_change(&self) -> bool {
        false
    }
}

/// The glyph-shaping capability.
///
/// Takes one window of UTF-16 code units and a font, returns glyph
/// records in the font's design units together with the direction the
/// backend detected for the window.
pub trait Shaper: Send + Sync {
    /// Identify yourself in logs and error messages
    fn name(&self) -> &'static str;

    /// Shape a non-empty window of UTF-16 code units.
    ///
    /// `glyphs[i].cluster` values are offsets into `window`. Failures
    /// indicate a broken font resource and are fatal to the caller.
    fn shape_utf16(
        &self,
        window: &[u16],
        font: &dyn FontRef,
        features: &[ShapingFeature],
    ) -> std::result::Result<ShapeOutput, ShapingError>;
}
