//! HarfBuzz shaping backend for glyphrun
//!
//! Implements the [`Shaper`] capability over `harfbuzz_rs`. The buffer
//! is populated codepoint by codepoint with explicit UTF-16 cluster
//! values, so cluster indices in the output line up with the engine's
//! code-unit offsets without any re-mapping. Segment properties
//! (direction, script, language) are guessed by HarfBuzz; explicit
//! itemization happens upstream of this crate, if at all.

use harfbuzz_rs::{
    shape, Direction as HbDirection, Face, Feature, Font as HbFont, Tag, UnicodeBuffer,
};

use glyphrun_core::{
    error::ShapingError,
    traits::{FontRef, Shaper},
    types::{FlowDirection, ShapeOutput, ShapedGlyph, ShapingFeature},
};

/// HarfBuzz shaping backend
pub struct HarfBuzzShaper;

impl HarfBuzzShaper {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HarfBuzzShaper {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a UTF-16 window into codepoints tagged with the code-unit
/// offset they start at. Unpaired halves decode to U+FFFD; the
/// segmenter never sends them, but the buffer must stay well formed if
/// someone else does.
fn decode_clusters(window: &[u16]) -> Vec<(char, u32)> {
    let mut decoded = Vec::with_capacity(window.len());
    let mut i = 0;
    while i < window.len() {
        let unit = window[i];
        let next = window.get(i + 1).copied();
        if (0xD800..=0xDBFF).contains(&unit)
            && next.is_some_and(|low| (0xDC00..=0xDFFF).contains(&low))
        {
            let low = u32::from(next.unwrap_or(0));
            let codepoint = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (low - 0xDC00);
            let ch = char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
            decoded.push((ch, i as u32));
            i += 2;
        } else {
            let ch = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
            decoded.push((ch, i as u32));
            i += 1;
        }
    }
    decoded
}

fn to_hb_feature(feature: &ShapingFeature) -> Feature {
    let tag = Tag::new(
        feature.tag[0] as char,
        feature.tag[1] as char,
        feature.tag[2] as char,
        feature.tag[3] as char,
    );
    Feature::new(tag, feature.value, ..)
}

impl Shaper for HarfBuzzShaper {
    fn name(&self) -> &'static str {
        "harfbuzz"
    }

    fn shape_utf16(
        &self,
        window: &[u16],
        font: &dyn FontRef,
        features: &[ShapingFeature],
    ) -> Result<ShapeOutput, ShapingError> {
        if window.is_empty() {
            return Err(ShapingError::EmptyWindow);
        }

        let data = font.data();
        if data.is_empty() {
            log::debug!("refusing to shape with '{}': no data", font.family_name());
            return Err(ShapingError::InvalidFont);
        }

        let face = Face::from_bytes(data, font.index());
        // Default font scale equals units-per-em, so positions come out
        // in design units and the engine applies its own scale factor.
        let hb_font = HbFont::new(face);

        let mut buffer = UnicodeBuffer::new();
        for (ch, cluster) in decode_clusters(window) {
            buffer = buffer.add(ch as u32, cluster);
        }
        let buffer = buffer.guess_segment_properties();
        let direction = match buffer.get_direction() {
            HbDirection::Rtl => FlowDirection::RightToLeft,
            _ => FlowDirection::LeftToRight,
        };

        let hb_features: Vec<Feature> = features.iter().map(to_hb_feature).collect();
        let output = shape(&hb_font, buffer, &hb_features);

        let infos = output.get_glyph_infos();
        let positions = output.get_glyph_positions();
        let glyphs = infos
            .iter()
            .zip(positions.iter())
            .map(|(info, pos)| ShapedGlyph {
                glyph_id: info.codepoint,
                cluster: info.cluster,
                x_advance: pos.x_advance,
                x_offset: pos.x_offset,
                y_offset: pos.y_offset,
            })
            .collect();

        Ok(ShapeOutput { glyphs, direction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphrun_core::types::FontId;

    struct TestFont {
        data: Vec<u8>,
    }

    impl FontRef for TestFont {
        fn data(&self) -> &[u8] {
            &self.data
        }

        fn family_name(&self) -> &str {
            "Test"
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, codepoint: u32) -> Option<u32> {
            Some(codepoint)
        }

        fn id(&self) -> FontId {
            FontId(1)
        }
    }

    #[test]
    fn empty_window_is_rejected() {
        let shaper = HarfBuzzShaper::new();
        let font = TestFont { data: vec![0; 16] };
        let result = shaper.shape_utf16(&[], &font, &[]);
        assert!(matches!(result, Err(ShapingError::EmptyWindow)));
    }

    #[test]
    fn dataless_font_is_rejected() {
        let shaper = HarfBuzzShaper::new();
        let font = TestFont { data: Vec::new() };
        let window: Vec<u16> = "Hi".encode_utf16().collect();
        let result = shaper.shape_utf16(&window, &font, &[]);
        assert!(matches!(result, Err(ShapingError::InvalidFont)));
    }

    #[test]
    fn decode_tags_surrogate_pairs_with_their_lead_offset() {
        let window: Vec<u16> = "a\u{1F600}b".encode_utf16().collect();
        let decoded = decode_clusters(&window);
        assert_eq!(
            decoded,
            vec![('a', 0), ('\u{1F600}', 1), ('b', 3)]
        );
    }

    #[test]
    fn decode_replaces_unpaired_halves() {
        let window = vec![0xD83Du16, u16::from(b'x')];
        let decoded = decode_clusters(&window);
        assert_eq!(decoded, vec![(char::REPLACEMENT_CHARACTER, 0), ('x', 1)]);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn shapes_ascii_with_a_system_font() {
        use std::fs;

        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        ];

        for font_path in font_paths {
            if let Ok(data) = fs::read(font_path) {
                let shaper = HarfBuzzShaper::new();
                let font = TestFont { data };
                let window: Vec<u16> = "Hi".encode_utf16().collect();

                let output = shaper.shape_utf16(&window, &font, &[]).unwrap();
                assert_eq!(output.glyphs.len(), 2);
                assert_eq!(output.direction, FlowDirection::LeftToRight);
                let clusters: Vec<u32> = output.glyphs.iter().map(|g| g.cluster).collect();
                assert_eq!(clusters, vec![0, 1]);
                assert!(output.glyphs.iter().all(|g| g.x_advance > 0));
                return;
            }
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn clusters_stay_utf16_relative_across_surrogates() {
        use std::fs;

        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        ];

        for font_path in font_paths {
            if let Ok(data) = fs::read(font_path) {
                let shaper = HarfBuzzShaper::new();
                let font = TestFont { data };
                // The emoji maps to .notdef in these fonts, but its
                // cluster must still be the lead-surrogate offset.
                let window: Vec<u16> = "a\u{1F600}b".encode_utf16().collect();

                let output = shaper.shape_utf16(&window, &font, &[]).unwrap();
                let clusters: Vec<u32> = output.glyphs.iter().map(|g| g.cluster).collect();
                assert_eq!(clusters, vec![0, 1, 3]);
                return;
            }
        }
    }
}
