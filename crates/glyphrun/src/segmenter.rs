// this_file: crates/glyphrun/src/segmenter.rs

//! Single-pass segmentation of a UTF-16 run into shapeable segments.
//!
//! The scanner is an explicit two-state machine. In the primary state
//! it advances until a boundary condition holds: a line break, a tab
//! (which always forms its own segment), an upcoming tab, a wrap
//! opportunity, or a character the primary font does not cover. An
//! uncovered character either defers one character to the fallback
//! state (when the platform matcher finds a substitute face) or is
//! dropped from the segment stream entirely (when it does not). The
//! fallback state consumes exactly one character, one or two code
//! units, and returns to the primary state unconditionally, so fallback
//! segments are never longer than one character even when neighbours
//! would resolve to the same substitute face.

use std::sync::Arc;

use glyphrun_core::error::Result;
use glyphrun_core::traits::{FontRef, Shaper};
use glyphrun_core::types::{ElementId, FontRequest};
use glyphrun_fontdb::{FallbackResolver, FontDetails};
use glyphrun_unicode::{self as unicode, BreakOpportunities, TAB};

use crate::adapter::{shape_window, SpaceGlyphCache};
use crate::segment::Segment;

type FontLoadedHook = Arc<dyn Fn() + Send + Sync>;

/// Which font the scanner is consuming with.
enum ScanState {
    /// Walking with the element's primary font.
    Primary,
    /// A substitute face has been resolved for the character at the
    /// cursor; exactly `units` code units will be emitted as their own
    /// segment before returning to `Primary`.
    Fallback {
        details: Arc<FontDetails>,
        units: usize,
    },
}

/// What the primary-state scan decided beyond closing the boundary.
enum PendingAction {
    None,
    /// Enter the fallback state for the next `units` code units.
    Fallback(Arc<FontDetails>, usize),
    /// Drop `units` code units; they belong to no segment.
    Skip(usize),
}

/// One segmentation pass over one run of text.
pub struct Segmenter<'a> {
    text: &'a [u16],
    element: ElementId,
    primary: &'a Arc<dyn FontRef>,
    request: &'a FontRequest,
    resolver: &'a FallbackResolver,
    shaper: &'a dyn Shaper,
    space_glyphs: &'a SpaceGlyphCache,
    font_loaded_hook: Option<FontLoadedHook>,
    breaks: BreakOpportunities,
    cursor: usize,
    state: ScanState,
}

impl<'a> Segmenter<'a> {
    pub fn new(
        text: &'a [u16],
        element: ElementId,
        primary: &'a Arc<dyn FontRef>,
        request: &'a FontRequest,
        resolver: &'a FallbackResolver,
        shaper: &'a dyn Shaper,
        space_glyphs: &'a SpaceGlyphCache,
    ) -> Self {
        Self {
            text,
            element,
            primary,
            request,
            resolver,
            shaper,
            space_glyphs,
            font_loaded_hook: None,
            breaks: BreakOpportunities::analyze(text),
            cursor: 0,
            state: ScanState::Primary,
        }
    }

    /// Install a callback invoked when a still-loading fallback face
    /// settles, so the owner can invalidate its cached segments.
    pub fn with_font_loaded_hook(mut self, hook: FontLoadedHook) -> Self {
        self.font_loaded_hook = Some(hook);
        self
    }

    /// Walk the whole text and return the ordered segment list.
    pub fn run(mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        while self.cursor < self.text.len() {
            if let Some(segment) = self.step()? {
                segments.push(segment);
            }
        }
        Ok(segments)
    }

    /// Advance past one boundary. Returns the finalized segment, or
    /// `None` when the step only dropped unmatchable code units.
    fn step(&mut self) -> Result<Option<Segment>> {
        match std::mem::replace(&mut self.state, ScanState::Primary) {
            ScanState::Primary => self.step_primary(),
            ScanState::Fallback { details, units } => self.step_fallback(details, units),
        }
    }

    fn step_primary(&mut self) -> Result<Option<Segment>> {
        let text = self.text;
        let len = text.len();
        let start = self.cursor;
        let mut i = start;

        let mut leading_spaces = 0usize;
        let mut trailing_spaces = 0usize;
        let mut line_break_length = 0usize;
        let mut word_break_after = false;
        let mut pending = PendingAction::None;

        // Leading whitespace never triggers a break by itself.
        while i < len && unicode::is_segment_space(text[i]) {
            leading_spaces += 1;
            i += 1;
        }

        // Keep the segment going until a boundary condition holds.
        while i < len {
            let break_len = unicode::line_break_length(text, i);
            if break_len > 0 {
                line_break_length = break_len;
                i += break_len;
                break;
            }

            // Tabs are shaped alone so their glyph can be patched; a tab
            // mid-scan closes the open segment without being consumed.
            if text[i] == TAB {
                word_break_after = true;
                if i == start {
                    i += 1;
                }
                break;
            }

            if i + 1 < len && text[i + 1] == TAB {
                if unicode::is_whitespace(text[i]) {
                    trailing_spaces += 1;
                }
                word_break_after = true;
                i += 1;
                break;
            }

            if self.breaks.has_opportunity_after(i) {
                if unicode::is_whitespace(text[i]) {
                    trailing_spaces += 1;
                }
                word_break_after = true;
                i += 1;
                break;
            }

            if unicode::is_surrogate_pair(text, i) {
                let codepoint = unicode::combine_surrogates(text[i], text[i + 1]);
                match self.resolver.resolve(codepoint, self.request) {
                    Some(details) => pending = PendingAction::Fallback(details, 2),
                    None => {
                        log::trace!("no font matches surrogate pair U+{codepoint:04X}, dropping");
                        pending = PendingAction::Skip(2);
                    }
                }
                break;
            }

            if unicode::is_surrogate(text[i]) {
                // An unpaired half encodes nothing; no face can draw it.
                log::trace!("dropping unpaired surrogate 0x{:04X}", text[i]);
                pending = PendingAction::Skip(1);
                break;
            }

            if !self.primary.covers(u32::from(text[i])) {
                match self.resolver.resolve(u32::from(text[i]), self.request) {
                    Some(details) => pending = PendingAction::Fallback(details, 1),
                    None => {
                        log::trace!(
                            "no font matches symbol U+{:04X}, dropping",
                            u32::from(text[i])
                        );
                        pending = PendingAction::Skip(1);
                    }
                }
                break;
            }

            i += 1;
        }

        // Fold any further whitespace run onto this segment so
        // inter-word spacing stays attached to the preceding word
        // instead of floating as its own segment.
        if line_break_length == 0 && matches!(pending, PendingAction::None) {
            while i < len {
                let break_len = unicode::line_break_length(text, i);
                if break_len > 0 {
                    line_break_length = break_len;
                    i += break_len;
                    break;
                }
                if unicode::is_segment_space(text[i]) {
                    trailing_spaces += 1;
                    i += 1;
                } else {
                    break;
                }
            }
        }

        let length = i - start;
        let segment = if length > 0 {
            // Both characters of a CRLF belong to one cluster: only the
            // first goes into the shaping window.
            let window_len = if line_break_length == 2 {
                length - 1
            } else {
                length
            };
            let (scale_x, scale_y) = self.scales(self.primary.as_ref());
            let (mut glyphs, direction) = shape_window(
                self.shaper,
                &text[start..start + window_len],
                self.primary.as_ref(),
                start,
                scale_x,
                scale_y,
            )?;

            debug_assert!(!text[start..i].contains(&TAB) || length == 1);
            if length == 1 && text[start] == TAB {
                let space = self
                    .space_glyphs
                    .space_glyph(self.primary.as_ref(), self.shaper)?;
                if let Some(glyph) = glyphs.first_mut() {
                    glyph.glyph_id = space;
                }
            }

            Some(Segment {
                element: self.element,
                direction,
                start,
                length,
                leading_spaces,
                trailing_spaces,
                line_break_length: line_break_length as u8,
                word_break_after,
                glyphs,
                fallback_font: None,
            })
        } else {
            None
        };

        match pending {
            PendingAction::Fallback(details, units) => {
                self.state = ScanState::Fallback { details, units };
                self.cursor = i;
            }
            PendingAction::Skip(units) => self.cursor = i + units,
            PendingAction::None => self.cursor = i,
        }

        Ok(segment)
    }

    fn step_fallback(
        &mut self,
        details: Arc<FontDetails>,
        units: usize,
    ) -> Result<Option<Segment>> {
        let start = self.cursor;

        if details.can_change() {
            if let Some(hook) = &self.font_loaded_hook {
                let hook = hook.clone();
                details.register_loaded_listener(Box::new(move || hook()));
            }
        }

        let word_break_after = self.breaks.has_opportunity_after(start + units - 1);

        let font = details.font().clone();
        let (scale_x, scale_y) = self.scales(font.as_ref());
        let (glyphs, direction) = shape_window(
            self.shaper,
            &self.text[start..start + units],
            font.as_ref(),
            start,
            scale_x,
            scale_y,
        )?;

        self.cursor = start + units;

        Ok(Some(Segment {
            element: self.element,
            direction,
            start,
            length: units,
            leading_spaces: 0,
            trailing_spaces: 0,
            line_break_length: 0,
            word_break_after,
            glyphs,
            fallback_font: Some(details),
        }))
    }

    fn scales(&self, font: &dyn FontRef) -> (f32, f32) {
        let scale_y = self.request.size / f32::from(font.units_per_em());
        (scale_y * self.request.horizontal_scale, scale_y)
    }
}
