//! The owner-facing surface: shared services plus the per-element run.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glyphrun_core::error::Result;
use glyphrun_core::traits::{FontMatcher, FontRef, Shaper};
use glyphrun_core::types::{ElementId, FontRequest};
use glyphrun_fontdb::{FallbackResolver, FontDetailsCache};

use crate::adapter::SpaceGlyphCache;
use crate::segment::Segment;
use crate::segmenter::Segmenter;

/// Shared services for segmentation: the shaping capability, the
/// fallback resolver and its caches. One per application; cheap to
/// clone and hand to every text element.
#[derive(Clone)]
pub struct ShapingContext {
    shaper: Arc<dyn Shaper>,
    resolver: Arc<FallbackResolver>,
    details: Arc<FontDetailsCache>,
    space_glyphs: Arc<SpaceGlyphCache>,
}

impl ShapingContext {
    pub fn new(matcher: Arc<dyn FontMatcher>, shaper: Arc<dyn Shaper>) -> Self {
        let details = Arc::new(FontDetailsCache::new());
        Self {
            shaper,
            resolver: Arc::new(FallbackResolver::new(matcher, details.clone())),
            details,
            space_glyphs: Arc::new(SpaceGlyphCache::new()),
        }
    }

    /// Context wired to the HarfBuzz shaping backend.
    #[cfg(feature = "shape-hb")]
    pub fn with_harfbuzz(matcher: Arc<dyn FontMatcher>) -> Self {
        Self::new(matcher, Arc::new(glyphrun_shape_hb::HarfBuzzShaper::new()))
    }

    pub fn shaper(&self) -> &dyn Shaper {
        self.shaper.as_ref()
    }

    pub fn resolver(&self) -> &FallbackResolver {
        &self.resolver
    }

    pub fn details_cache(&self) -> &Arc<FontDetailsCache> {
        &self.details
    }

    pub fn space_glyphs(&self) -> &SpaceGlyphCache {
        &self.space_glyphs
    }
}

/// One run of text owned by one element: the text, the primary font,
/// and the lazily computed segment list.
///
/// The segment cache is deliberately unsynchronized beyond interior
/// locking: concurrent calls for the *same* run must be serialized by
/// the owner, matching the single-threaded-per-element contract.
pub struct TextRun {
    element: ElementId,
    context: ShapingContext,
    text: Vec<u16>,
    font: Arc<dyn FontRef>,
    request: FontRequest,
    cache: Mutex<Option<Arc<Vec<Segment>>>>,
    fonts_changed: Arc<AtomicBool>,
}

impl TextRun {
    pub fn new(
        context: &ShapingContext,
        text: &str,
        font: Arc<dyn FontRef>,
        request: FontRequest,
    ) -> Self {
        Self {
            element: ElementId::next(),
            context: context.clone(),
            text: text.encode_utf16().collect(),
            font,
            request,
            cache: Mutex::new(None),
            fonts_changed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The run text as the engine sees it: UTF-16 code units.
    pub fn text_utf16(&self) -> &[u16] {
        &self.text
    }

    pub fn request(&self) -> &FontRequest {
        &self.request
    }

    /// The ordered segment list, computed on first access and cached.
    ///
    /// Until something invalidates the run, repeated calls return the
    /// identical `Arc`.
    pub fn segments(&self) -> Result<Arc<Vec<Segment>>> {
        let mut cache = self.cache.lock();
        if self.fonts_changed.swap(false, Ordering::AcqRel) {
            *cache = None;
        }
        if let Some(segments) = cache.as_ref() {
            return Ok(segments.clone());
        }

        let hook: Arc<dyn Fn() + Send + Sync> = {
            let flag = self.fonts_changed.clone();
            Arc::new(move || flag.store(true, Ordering::Release))
        };

        let segments = Segmenter::new(
            &self.text,
            self.element,
            &self.font,
            &self.request,
            self.context.resolver(),
            self.context.shaper(),
            self.context.space_glyphs(),
        )
        .with_font_loaded_hook(hook)
        .run()?;

        let segments = Arc::new(segments);
        *cache = Some(segments.clone());
        Ok(segments)
    }

    /// Discard the cached segment list. Called by the owner whenever
    /// text, font, or font-loading state changes.
    pub fn invalidate_segments(&self) {
        *self.cache.lock() = None;
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.encode_utf16().collect();
        self.invalidate_segments();
    }

    pub fn set_font(&mut self, font: Arc<dyn FontRef>) {
        self.font = font;
        self.invalidate_segments();
    }

    pub fn set_request(&mut self, request: FontRequest) {
        self.request = request;
        self.invalidate_segments();
    }
}
