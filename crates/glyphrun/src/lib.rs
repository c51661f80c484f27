//! Glyphrun: text-run segmentation and shaping preparation
//!
//! Given a run of text and a requested font, glyphrun splits the run
//! into the minimal sequence of contiguous segments that can each be
//! handed whole to a glyph-shaping engine, resolving per segment which
//! physical font must be used. Segmentation keeps shaping boundaries
//! aligned with line-layout boundaries (word-wrap opportunities, line
//! breaks), gives tabs and fallback characters their own segments, and
//! drops characters no installed font can draw instead of failing.
//!
//! ## The moving parts
//!
//! 1. **Segmenter** - walks the UTF-16 text once and closes a segment
//!    at every boundary
//! 2. **Fallback resolver** - finds a substitute face when the primary
//!    font lacks a glyph, with shared caching
//! 3. **Shaping adapter** - feeds each window to the shaping
//!    capability with ligatures off and scales positions into logical
//!    units
//! 4. **[`TextRun`]** - the owner-facing cache: lazy `segments()`,
//!    explicit `invalidate_segments()`
//!
//! ## A first run
//!
//! ```no_run
//! use std::sync::Arc;
//! use glyphrun::fontdb::{DatabaseFontMatcher, Font, FontDatabase};
//! use glyphrun::types::FontRequest;
//! use glyphrun::{ShapingContext, TextRun};
//!
//! # fn main() -> glyphrun::error::Result<()> {
//! let mut db = FontDatabase::new();
//! let primary = db.load_font("fonts/NotoSans-Regular.ttf")?;
//! db.load_font("fonts/NotoColorEmoji.ttf")?;
//!
//! let context = ShapingContext::with_harfbuzz(Arc::new(DatabaseFontMatcher::new(Arc::new(db))));
//! let run = TextRun::new(&context, "Hello 🌍", primary, FontRequest::new("Noto Sans", 16.0));
//!
//! for segment in run.segments()?.iter() {
//!     println!("{:?} -> {} glyphs", segment.range(), segment.glyphs().len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Bidirectional reordering happens downstream: segments come back in
//! logical order with the direction the shaping engine detected, and
//! the consuming layout reorders lines.

mod adapter;
pub mod run;
pub mod segment;
pub mod segmenter;

pub use adapter::SpaceGlyphCache;
pub use run::{ShapingContext, TextRun};
pub use segment::Segment;
pub use segmenter::Segmenter;

pub use glyphrun_core::{error, traits, types};
pub use glyphrun_fontdb as fontdb;
pub use glyphrun_unicode as unicode;

#[cfg(feature = "shape-hb")]
pub use glyphrun_shape_hb as shape_hb;

/// Common imports for typical usage
pub mod prelude {
    pub use glyphrun_core::{
        error::{GlyphRunError, Result},
        traits::{FontMatcher, FontRef, Shaper},
        types::{ElementId, FlowDirection, FontRequest, GlyphInfo},
    };
    pub use glyphrun_fontdb::{
        DatabaseFontMatcher, FallbackResolver, Font, FontDatabase, FontDetails, FontDetailsCache,
    };

    pub use crate::{Segment, ShapingContext, TextRun};
}
