//! Text shaping and rasterization.
//!
//! Text objects are shaped at the 72 px base size through usvg's text
//! support (system fonts via fontdb) and rasterized once into a cached
//! pixmap; the renderer places that pixmap with the object's transform every
//! frame. The measured extents double as the hit-test metrics, so hit boxes
//! always reflect what was actually rendered.

use sonic_core::{Color, FontId, TextMeasurer, TEXT_BASE_SIZE};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::Pixmap;
use tracing::{debug, warn};

/// SVG scratch-canvas geometry: glyphs are laid out against this baseline
/// and measured back out of the parsed tree.
const SHAPE_CANVAS_WIDTH: u32 = 8192;
const SHAPE_CANVAS_HEIGHT: u32 = 512;
const BASELINE_X: f32 = 256.0;
const BASELINE_Y: f32 = 384.0;

/// One pixel of padding around the rasterized glyphs
const RASTER_PAD: f32 = 1.0;

/// A shaped and rasterized piece of text.
pub struct ShapedText {
    /// Rasterized glyphs at the base size
    pub pixmap: Pixmap,
    /// X of the pixmap's left edge in text-local (baseline-origin) space
    pub left: f32,
    /// Y of the pixmap's top edge in text-local space (negative: above the
    /// baseline)
    pub top: f32,
    /// Distance from the origin to the right edge of the ink
    pub advance: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
    text: String,
    font: FontId,
    color: Color,
}

/// Shapes text and caches the rasterized result per (content, font, color).
pub struct TextShaper {
    options: usvg::Options<'static>,
    cache: RefCell<HashMap<ShapeKey, Option<Arc<ShapedText>>>>,
}

impl TextShaper {
    /// Create a shaper over the system font database.
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        debug!(
            "Text shaper initialized with {} font faces",
            options.fontdb.len()
        );
        Self {
            options,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Shape `text` in `font` filled with `color`.
    ///
    /// Returns `None` (after logging once) when the content has no ink —
    /// empty/whitespace-only strings, or no usable font on the host. Callers
    /// skip such text; it is never fatal.
    pub fn shape(&self, text: &str, font: FontId, color: Color) -> Option<Arc<ShapedText>> {
        if text.is_empty() {
            return None;
        }
        let key = ShapeKey {
            text: text.to_string(),
            font,
            color,
        };
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }
        let shaped = self.shape_uncached(text, font, color).map(Arc::new);
        self.cache.borrow_mut().insert(key, shaped.clone());
        shaped
    }

    fn shape_uncached(&self, text: &str, font: FontId, color: Color) -> Option<ShapedText> {
        let svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" fill="{fill}" xml:space="preserve">{content}</text></svg>"##,
            w = SHAPE_CANVAS_WIDTH,
            h = SHAPE_CANVAS_HEIGHT,
            x = BASELINE_X,
            y = BASELINE_Y,
            family = font.family(),
            size = TEXT_BASE_SIZE,
            weight = font.weight(),
            fill = color.to_hex(),
            content = escape_xml(text),
        );

        let tree = match usvg::Tree::from_str(&svg, &self.options) {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Failed to shape text {:?}: {}", text, e);
                return None;
            }
        };

        let bbox = tree.root().abs_bounding_box();
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            debug!("Text {:?} shaped to empty ink", text);
            return None;
        }

        let raster_width = (bbox.width() + 2.0 * RASTER_PAD).ceil() as u32;
        let raster_height = (bbox.height() + 2.0 * RASTER_PAD).ceil() as u32;
        let mut pixmap = Pixmap::new(raster_width, raster_height)?;
        resvg::render(
            &tree,
            tiny_skia::Transform::from_translate(
                -(bbox.x() - RASTER_PAD),
                -(bbox.y() - RASTER_PAD),
            ),
            &mut pixmap.as_mut(),
        );

        Some(ShapedText {
            pixmap,
            left: bbox.x() - BASELINE_X - RASTER_PAD,
            top: bbox.y() - BASELINE_Y - RASTER_PAD,
            advance: bbox.x() + bbox.width() - BASELINE_X,
        })
    }

    /// Whether any font is available at all. When this is false every text
    /// renders as nothing (with warnings), but the pipeline keeps running.
    pub fn has_fonts(&self) -> bool {
        self.options.fontdb.len() > 0
    }
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for TextShaper {
    fn advance_width(&self, text: &str, font: FontId) -> f32 {
        self.shape(text, font, Color::WHITE)
            .map(|shaped| shaped.advance.max(0.0))
            .unwrap_or(0.0)
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b&c>\"d'"), "a&lt;b&amp;c&gt;&quot;d&apos;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_empty_text_shapes_to_none() {
        let shaper = TextShaper::new();
        assert!(shaper.shape("", FontId::Classic, Color::WHITE).is_none());
        assert_eq!(shaper.advance_width("", FontId::Classic), 0.0);
    }

    #[test]
    fn test_shaping_when_fonts_available() {
        let shaper = TextShaper::new();
        if !shaper.has_fonts() {
            // Headless host without fonts: shaping degrades to None, which
            // the renderer tolerates
            assert!(shaper.shape("hello", FontId::Classic, Color::WHITE).is_none());
            return;
        }

        let shaped = shaper
            .shape("hello", FontId::Classic, Color::WHITE)
            .expect("fonts available");
        assert!(shaped.pixmap.width() > 0);
        assert!(shaped.advance > 0.0);
        // One 72px line of latin text: ink above the baseline
        assert!(shaped.top < 0.0);

        // Longer text is wider
        let longer = shaper
            .shape("hello world", FontId::Classic, Color::WHITE)
            .unwrap();
        assert!(longer.advance > shaped.advance);
    }

    #[test]
    fn test_shape_is_cached() {
        let shaper = TextShaper::new();
        let a = shaper.shape("cache me", FontId::Neon, Color::WHITE);
        let b = shaper.shape("cache me", FontId::Neon, Color::WHITE);
        match (a, b) {
            (Some(a), Some(b)) => assert!(Arc::ptr_eq(&a, &b)),
            (None, None) => {}
            _ => panic!("cache must be deterministic"),
        }
    }
}
