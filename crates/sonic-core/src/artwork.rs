//! Artwork Model - strokes and text objects
//!
//! The artwork model is the only durable state in the system. Everything the
//! reactive pipeline produces (feature snapshots, effect parameters, the
//! ephemeral surface) is derived from it plus the current audio frame and is
//! discarded every tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Unique identifier for a text object
pub type TextId = u64;

/// Base font size in canvas pixels at object scale 1.0
pub const TEXT_BASE_SIZE: f32 = 72.0;

/// Padding around a text's measured box when hit testing
pub const TEXT_HIT_PADDING: f32 = 50.0;

/// Straight (non-premultiplied) RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// White
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    /// The color-picker preset swatches
    pub const PRESETS: [Color; 10] = [
        Color::rgb(0xff, 0xff, 0xff),
        Color::rgb(0xef, 0x44, 0x44),
        Color::rgb(0xf9, 0x73, 0x16),
        Color::rgb(0xea, 0xb3, 0x08),
        Color::rgb(0x22, 0xc5, 0x5e),
        Color::rgb(0x06, 0xb6, 0xd4),
        Color::rgb(0x3b, 0x82, 0xf6),
        Color::rgb(0x8b, 0x5c, 0xf6),
        Color::rgb(0xec, 0x48, 0x99),
        Color::rgb(0x00, 0x00, 0x00),
    ];

    /// Create a color from 8-bit channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Format as a `#rrggbb` hex string
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One of the fixed set of text fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontId {
    /// System sans, semibold
    Classic,
    /// Display sans, bold
    Modern,
    /// Monospace, bold
    Neon,
    /// Typewriter serif
    Typewriter,
    /// Condensed impact face
    Strong,
    /// Script / cursive
    Cursive,
}

impl FontId {
    /// All fonts, in picker order
    pub const ALL: [FontId; 6] = [
        FontId::Classic,
        FontId::Modern,
        FontId::Neon,
        FontId::Typewriter,
        FontId::Strong,
        FontId::Cursive,
    ];

    /// Font family stack, best match first
    pub fn family(&self) -> &'static str {
        match self {
            FontId::Classic => "system-ui, -apple-system, sans-serif",
            FontId::Modern => "SF Pro Display, -apple-system, sans-serif",
            FontId::Neon => "Courier New, monospace",
            FontId::Typewriter => "American Typewriter, Courier, monospace",
            FontId::Strong => "Impact, Haettenschweiler, sans-serif",
            FontId::Cursive => "Snell Roundhand, cursive",
        }
    }

    /// Font weight (CSS numeric scale)
    pub fn weight(&self) -> u16 {
        match self {
            FontId::Classic => 600,
            FontId::Modern => 700,
            FontId::Neon => 700,
            FontId::Typewriter => 400,
            FontId::Strong => 400,
            FontId::Cursive => 400,
        }
    }

    /// Display name for pickers
    pub fn label(&self) -> &'static str {
        match self {
            FontId::Classic => "Classic",
            FontId::Modern => "Modern",
            FontId::Neon => "Neon",
            FontId::Typewriter => "Type",
            FontId::Strong => "Strong",
            FontId::Cursive => "Script",
        }
    }
}

/// A finalized freehand stroke.
///
/// Points are in canvas space, in drawing order. A stroke is immutable once
/// appended to the model and is destroyed only by [`ArtworkModel::clear`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Ordered points in canvas space
    pub points: Vec<Vec2>,
    /// Stroke color
    pub color: Color,
    /// Base stroke width in canvas pixels
    pub width: f32,
}

/// A placed text object.
///
/// The "being composed" flag is held by the interaction state machine, not
/// here; while composing, `text` holds the last committed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    /// Unique id within the model
    pub id: TextId,
    /// Text content (empty only transiently while being composed)
    pub text: String,
    /// Baseline-anchored position in canvas space
    pub position: Vec2,
    /// Uniform scale factor
    pub scale: f32,
    /// Rotation in degrees
    pub rotation_deg: f32,
    /// Fill color
    pub color: Color,
    /// Font
    pub font: FontId,
}

/// Measures text advance width at [`TEXT_BASE_SIZE`].
///
/// Implemented by the render crate's shaper; tests use a fixed-advance
/// double. Width is measured at scale 1.0; callers apply the object scale.
pub trait TextMeasurer {
    /// Advance width of `text` in canvas pixels at the base font size
    fn advance_width(&self, text: &str, font: FontId) -> f32;
}

/// Owns all strokes and text objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtworkModel {
    strokes: Vec<Stroke>,
    texts: Vec<TextObject>,
    next_text_id: TextId,
}

impl ArtworkModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized stroke. Sequences shorter than two points are not
    /// strokes and are ignored.
    pub fn append_stroke(&mut self, stroke: Stroke) {
        if stroke.points.len() < 2 {
            debug!("Ignoring stroke with {} point(s)", stroke.points.len());
            return;
        }
        self.strokes.push(stroke);
    }

    /// Create a new, empty text object at `position` and return its id.
    pub fn add_text(&mut self, position: Vec2, color: Color, font: FontId) -> TextId {
        let id = self.next_text_id;
        self.next_text_id += 1;
        self.texts.push(TextObject {
            id,
            text: String::new(),
            position,
            scale: 1.0,
            rotation_deg: 0.0,
            color,
            font,
        });
        id
    }

    /// Get a text object by id
    pub fn text(&self, id: TextId) -> Option<&TextObject> {
        self.texts.iter().find(|t| t.id == id)
    }

    /// Get a mutable text object by id
    pub fn text_mut(&mut self, id: TextId) -> Option<&mut TextObject> {
        self.texts.iter_mut().find(|t| t.id == id)
    }

    /// Remove a text object by id
    pub fn remove_text(&mut self, id: TextId) -> Option<TextObject> {
        let index = self.texts.iter().position(|t| t.id == id)?;
        Some(self.texts.remove(index))
    }

    /// All strokes in creation order
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// All text objects in creation order
    pub fn texts(&self) -> &[TextObject] {
        &self.texts
    }

    /// Remove all strokes and texts. Both collections are emptied under one
    /// exclusive borrow; there is no observable state with only one cleared.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.texts.clear();
    }

    /// Hit test a canvas-space point against text bounding boxes.
    ///
    /// Later-created (topmost) text wins; the box is the measured advance
    /// width at the object's current scale, one line of [`TEXT_BASE_SIZE`]
    /// above the baseline, padded by [`TEXT_HIT_PADDING`] on every side.
    pub fn hit_test_text(&self, point: Vec2, measurer: &dyn TextMeasurer) -> Option<TextId> {
        for t in self.texts.iter().rev() {
            if t.text.is_empty() {
                continue;
            }
            let width = measurer.advance_width(&t.text, t.font) * t.scale;
            let height = TEXT_BASE_SIZE * t.scale;
            if point.x >= t.position.x - TEXT_HIT_PADDING
                && point.x <= t.position.x + width + TEXT_HIT_PADDING
                && point.y >= t.position.y - height - TEXT_HIT_PADDING
                && point.y <= t.position.y + TEXT_HIT_PADDING
            {
                return Some(t.id);
            }
        }
        None
    }
}
