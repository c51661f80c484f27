//! Fallback font resolution for codepoints the primary font lacks.
//!
//! One query to the platform matcher per distinct (codepoint, request)
//! combination: results, including misses, land in a bounded LRU so the
//! segmenter can probe freely on its hot path. A miss is not an error;
//! it means the character will be dropped from the segment stream.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use glyphrun_core::traits::FontMatcher;
use glyphrun_core::types::FontRequest;

use crate::details::{FontDetails, FontDetailsCache, FontKey};

/// Bounded size of the recent-resolution cache.
const RECENT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(v) => v,
    None => unreachable!(),
};

/// Resolves substitute faces through the platform matcher, interning
/// results in the shared [`FontDetailsCache`].
pub struct FallbackResolver {
    matcher: Arc<dyn FontMatcher>,
    details: Arc<FontDetailsCache>,
    recent: Mutex<LruCache<(u32, FontKey), Option<Arc<FontDetails>>>>,
}

impl FallbackResolver {
    pub fn new(matcher: Arc<dyn FontMatcher>, details: Arc<FontDetailsCache>) -> Self {
        Self {
            matcher,
            details,
            recent: Mutex::new(LruCache::new(RECENT_CAPACITY)),
        }
    }

    /// Find a substitute face for `codepoint`, resolved under
    /// `request`'s size/weight/stretch/style. `None` means no installed
    /// face covers the codepoint.
    pub fn resolve(&self, codepoint: u32, request: &FontRequest) -> Option<Arc<FontDetails>> {
        let key = (codepoint, FontKey::new(&request.family, request));
        if let Some(hit) = self.recent.lock().get(&key) {
            return hit.clone();
        }

        let resolved = self.matcher.match_character(codepoint).map(|face| {
            self.details
                .get_or_insert(face, request, self.matcher.faces_can_change())
        });
        if resolved.is_none() {
            log::trace!("no installed font covers U+{codepoint:04X}");
        }

        self.recent.lock().put(key, resolved.clone());
        resolved
    }

    pub fn details_cache(&self) -> &Arc<FontDetailsCache> {
        &self.details
    }
}
