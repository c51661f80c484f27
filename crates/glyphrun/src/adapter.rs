//! Bridges the segmenter and the shaping capability.
//!
//! Shaping backends speak design units and window-relative clusters;
//! segments need logical units and run-relative clusters. The
//! conversion, the ligature policy, and the per-font space-glyph
//! memoization all live here.

use parking_lot::Mutex;
use std::collections::HashMap;

use glyphrun_core::error::ShapingError;
use glyphrun_core::traits::{FontRef, Shaper};
use glyphrun_core::types::{FlowDirection, FontId, GlyphInfo, ShapingFeature};

/// Ligatures collapse several source characters into one glyph, which
/// breaks the cluster-per-character offsets editing code relies on, so
/// every window is shaped with them turned off.
pub(crate) const DISABLE_LIGATURES: &[ShapingFeature] = &[ShapingFeature::new(*b"liga", 0)];

/// Shape one window and convert the backend's records into
/// [`GlyphInfo`] values.
///
/// Clusters are rebased from window-relative to run-relative offsets.
/// When the backend reports right-to-left, the glyph sequence is
/// reversed so consumers always read glyphs in the same order.
pub(crate) fn shape_window(
    shaper: &dyn Shaper,
    window: &[u16],
    font: &dyn FontRef,
    cluster_base: usize,
    scale_x: f32,
    scale_y: f32,
) -> Result<(Vec<GlyphInfo>, FlowDirection), ShapingError> {
    debug_assert!(!window.is_empty(), "empty windows must not reach the shaper");

    let output = shaper.shape_utf16(window, font, DISABLE_LIGATURES)?;
    let mut glyphs: Vec<GlyphInfo> = output
        .glyphs
        .iter()
        .map(|glyph| GlyphInfo {
            glyph_id: glyph.glyph_id as u16,
            cluster: cluster_base + glyph.cluster as usize,
            advance: glyph.x_advance as f32 * scale_x,
            offset_x: glyph.x_offset as f32 * scale_x,
            offset_y: glyph.y_offset as f32 * scale_y,
        })
        .collect();

    if output.direction == FlowDirection::RightToLeft {
        glyphs.reverse();
    }

    Ok((glyphs, output.direction))
}

/// Per-font memoization of the space glyph id.
///
/// Tab segments are shaped normally and then have their glyph id
/// rewritten to the font's space glyph; shaping a literal space once
/// per font is all that takes. First population happens under the
/// lock, so concurrent callers wait instead of shaping twice.
pub struct SpaceGlyphCache {
    glyphs: Mutex<HashMap<FontId, u16>>,
}

impl SpaceGlyphCache {
    pub fn new() -> Self {
        Self {
            glyphs: Mutex::new(HashMap::new()),
        }
    }

    /// The glyph id this font renders a space with.
    pub fn space_glyph(
        &self,
        font: &dyn FontRef,
        shaper: &dyn Shaper,
    ) -> Result<u16, ShapingError> {
        let mut glyphs = self.glyphs.lock();
        if let Some(&id) = glyphs.get(&font.id()) {
            return Ok(id);
        }

        let output = shaper.shape_utf16(&[0x0020], font, &[])?;
        let id = output
            .glyphs
            .first()
            .map(|glyph| glyph.glyph_id as u16)
            .unwrap_or(0);
        glyphs.insert(font.id(), id);
        Ok(id)
    }
}

impl Default for SpaceGlyphCache {
    fn default() -> Self {
        Self::new()
    }
}
