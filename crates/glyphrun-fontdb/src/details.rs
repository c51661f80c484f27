// this_file: crates/glyphrun-fontdb/src/details.rs

//! Resolved font details, shared and cached across runs and elements.
//!
//! A [`FontDetails`] ties a concrete face to the size/weight/stretch/
//! style combination it was resolved under. The cache interns one
//! details object per combination so every element asking for the same
//! fallback shares it, including its font-loaded notification list.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glyphrun_core::traits::FontRef;
use glyphrun_core::types::{FontRequest, FontStretch, FontStyle, FontWeight};

/// Cache key: the combination a face was resolved under.
///
/// Sizes are stored as raw bits so the key stays `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    family: String,
    size_bits: u32,
    weight: FontWeight,
    stretch: FontStretch,
    style: FontStyle,
}

impl FontKey {
    pub fn new(family: &str, request: &FontRequest) -> Self {
        Self {
            family: family.to_owned(),
            size_bits: request.size.to_bits(),
            weight: request.weight,
            stretch: request.stretch,
            style: request.style,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

type LoadedListener = Box<dyn Fn() + Send + Sync>;

/// A resolved substitute face plus the parameters it will be shaped at.
///
/// `can_change` reports whether the underlying face may still be
/// replaced (asynchronous loading); elements subscribe through
/// [`FontDetails::register_loaded_listener`] to hear when it settles.
pub struct FontDetails {
    font: Arc<dyn FontRef>,
    key: FontKey,
    can_change: AtomicBool,
    loaded_listeners: Mutex<Vec<LoadedListener>>,
}

impl FontDetails {
    pub(crate) fn new(font: Arc<dyn FontRef>, key: FontKey, can_change: bool) -> Self {
        Self {
            font,
            key,
            can_change: AtomicBool::new(can_change),
            loaded_listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn font(&self) -> &Arc<dyn FontRef> {
        &self.font
    }

    pub fn key(&self) -> &FontKey {
        &self.key
    }

    /// May the underlying face still change (async loading in flight)?
    pub fn can_change(&self) -> bool {
        self.can_change.load(Ordering::Acquire)
    }

    /// Subscribe for the face becoming final. If loading has already
    /// settled the listener fires immediately.
    pub fn register_loaded_listener(&self, listener: LoadedListener) {
        if self.can_change() {
            self.loaded_listeners.lock().push(listener);
        } else {
            listener();
        }
    }

    /// Mark the face as settled and notify every subscriber once.
    pub fn mark_loaded(&self) {
        self.can_change.store(false, Ordering::Release);
        let listeners = std::mem::take(&mut *self.loaded_listeners.lock());
        for listener in listeners {
            listener();
        }
    }
}

/// Process-wide interning cache for [`FontDetails`].
///
/// Read-mostly and shared: concurrent first-population for the same key
/// is resolved by the map, so exactly one details object survives.
pub struct FontDetailsCache {
    entries: DashMap<FontKey, Arc<FontDetails>>,
}

impl FontDetailsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fetch or create the details object for `face` under `request`'s
    /// size/weight/stretch/style.
    pub fn get_or_insert(
        &self,
        face: Arc<dyn FontRef>,
        request: &FontRequest,
        can_change: bool,
    ) -> Arc<FontDetails> {
        let key = FontKey::new(face.family_name(), request);
        self.entries
            .entry(key.clone())
            .or_insert_with(|| {
                log::debug!(
                    "caching font details for '{}' at {}px",
                    key.family(),
                    key.size()
                );
                Arc::new(FontDetails::new(face, key, can_change))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for FontDetailsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphrun_core::types::{FontId, GlyphId};
    use std::sync::atomic::AtomicUsize;

    struct StubFace {
        family: &'static str,
    }

    impl FontRef for StubFace {
        fn data(&self) -> &[u8] {
            &[]
        }

        fn family_name(&self) -> &str {
            self.family
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, _codepoint: u32) -> Option<GlyphId> {
            Some(1)
        }

        fn id(&self) -> FontId {
            FontId(7)
        }
    }

    fn request(size: f32) -> FontRequest {
        FontRequest::new("Primary", size)
    }

    #[test]
    fn equal_keys_share_one_details_object() {
        let cache = FontDetailsCache::new();
        let face: Arc<dyn FontRef> = Arc::new(StubFace { family: "Emoji" });

        let a = cache.get_or_insert(face.clone(), &request(16.0), false);
        let b = cache.get_or_insert(face.clone(), &request(16.0), false);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let c = cache.get_or_insert(face, &request(24.0), false);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn key_uses_face_family_not_request_family() {
        let cache = FontDetailsCache::new();
        let face: Arc<dyn FontRef> = Arc::new(StubFace { family: "Emoji" });
        let details = cache.get_or_insert(face, &request(16.0), false);
        assert_eq!(details.key().family(), "Emoji");
        assert_eq!(details.key().size(), 16.0);
    }

    #[test]
    fn mark_loaded_notifies_each_listener_once() {
        let face: Arc<dyn FontRef> = Arc::new(StubFace { family: "Emoji" });
        let details = FontDetails::new(face, FontKey::new("Emoji", &request(16.0)), true);

        let fired = Arc::new(AtomicUsize::new(0));
        let count = fired.clone();
        details.register_loaded_listener(Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(details.can_change());
        details.mark_loaded();
        assert!(!details.can_change());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Listeners registered after settling fire immediately.
        let count = fired.clone();
        details.register_loaded_listener(Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        details.mark_loaded();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
