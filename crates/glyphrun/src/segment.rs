//! The segment model: one shapeable contiguous sub-range of a run.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use glyphrun_core::types::{ElementId, FlowDirection, GlyphInfo};
use glyphrun_fontdb::FontDetails;

/// One contiguous sub-range of a run that was shaped as a unit with a
/// single font.
///
/// Segments are produced in ascending order of `start` regardless of
/// flow direction; reordering for bidirectional layout belongs to the
/// consuming layout system. Every materialized segment has `length > 0`.
pub struct Segment {
    pub(crate) element: ElementId,
    pub(crate) direction: FlowDirection,
    pub(crate) start: usize,
    pub(crate) length: usize,
    pub(crate) leading_spaces: usize,
    pub(crate) trailing_spaces: usize,
    pub(crate) line_break_length: u8,
    pub(crate) word_break_after: bool,
    pub(crate) glyphs: Vec<GlyphInfo>,
    pub(crate) fallback_font: Option<Arc<FontDetails>>,
}

impl Segment {
    /// Non-owning handle of the text element this segment belongs to
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Flow direction as reported by the shaping engine
    pub fn direction(&self) -> FlowDirection {
        self.direction
    }

    /// Start offset into the run text, in UTF-16 code units
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length in UTF-16 code units; always positive
    pub fn length(&self) -> usize {
        self.length
    }

    /// One past the last code unit covered by this segment
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// The code-unit range this segment covers
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Count of whitespace code units at the start of the segment
    pub fn leading_spaces(&self) -> usize {
        self.leading_spaces
    }

    /// Count of whitespace code units folded onto the end of the segment
    pub fn trailing_spaces(&self) -> usize {
        self.trailing_spaces
    }

    /// 0 when the segment does not end in a line break, 1 for a single
    /// break character, 2 for the CRLF sequence
    pub fn line_break_length(&self) -> u8 {
        self.line_break_length
    }

    /// Whether a line may legally wrap immediately after this segment
    pub fn word_break_after(&self) -> bool {
        self.word_break_after
    }

    /// Shaped glyphs, listed in visual order
    pub fn glyphs(&self) -> &[GlyphInfo] {
        &self.glyphs
    }

    /// The substitute font used for this segment, absent when the
    /// primary font was used
    pub fn fallback_font(&self) -> Option<&Arc<FontDetails>> {
        self.fallback_font.as_ref()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("range", &self.range())
            .field("direction", &self.direction)
            .field("leading_spaces", &self.leading_spaces)
            .field("trailing_spaces", &self.trailing_spaces)
            .field("line_break_length", &self.line_break_length)
            .field("word_break_after", &self.word_break_after)
            .field("glyphs", &self.glyphs.len())
            .field("fallback", &self.fallback_font.is_some())
            .finish()
    }
}
