//! Mode and gesture state machine.
//!
//! Tracks the top-level tool mode and, within text mode, the tagged
//! interaction sub-state (idle / composing / selected / dragging / pinching)
//! with explicit entry data. All artwork mutations happen synchronously
//! through these handlers; drag and pinch on the same object are mutually
//! exclusive by construction since drag needs exactly one active touch and
//! pinch exactly two.

use crate::artwork::{ArtworkModel, Color, FontId, Stroke, TextId, TextMeasurer};
use glam::Vec2;
use tracing::debug;

/// Smallest two-finger scale factor
pub const MIN_PINCH_SCALE: f32 = 0.3;

/// Largest two-finger scale factor. Rotation is deliberately unbounded and
/// may accumulate past ±360°.
pub const MAX_PINCH_SCALE: f32 = 4.0;

/// Top-level tool mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Freehand drawing
    Draw,
    /// Text placement and editing
    Text,
    /// Effect-channel settings panel
    Settings,
}

/// Snapshot taken when a two-finger gesture begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchStart {
    /// Distance between the two touches
    pub distance: f32,
    /// Angle of the line between the two touches, degrees
    pub angle_deg: f32,
    /// The object's scale at gesture start
    pub scale: f32,
    /// The object's rotation at gesture start, degrees
    pub rotation_deg: f32,
}

/// Text-mode interaction sub-state
#[derive(Debug, Clone, PartialEq)]
pub enum TextGesture {
    /// Nothing selected
    Idle,
    /// One object is being composed; its pending content lives here, not on
    /// the object, until commit
    Composing {
        /// Object under composition
        id: TextId,
        /// Pending content
        buffer: String,
    },
    /// One object is selected
    Selected {
        /// Selected object
        id: TextId,
    },
    /// Selected object follows a single touch
    Dragging {
        /// Dragged object
        id: TextId,
        /// Touch point minus object position, held for the gesture duration
        grab_offset: Vec2,
    },
    /// Selected object is scaled/rotated by two touches
    Pinching {
        /// Gestured object
        id: TextId,
        /// Snapshot taken at gesture start
        start: PinchStart,
    },
}

/// Maps displayed-size pointer coordinates into canvas space.
///
/// Input dispatch delivers pointer events in displayed-surface coordinates;
/// the canvas runs at its native resolution. The mapping is the fixed linear
/// scale between the two.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    native: Vec2,
    displayed: Vec2,
}

impl Viewport {
    /// Create a viewport for a canvas shown at `displayed` size
    pub fn new(native: (u32, u32), displayed: (f32, f32)) -> Self {
        Self {
            native: Vec2::new(native.0 as f32, native.1 as f32),
            displayed: Vec2::new(displayed.0.max(1.0), displayed.1.max(1.0)),
        }
    }

    /// Translate a displayed-space point into canvas space
    pub fn to_canvas(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            x * self.native.x / self.displayed.x,
            y * self.native.y / self.displayed.y,
        )
    }
}

/// Drives mode switches, stroke capture and text gestures.
#[derive(Debug)]
pub struct InteractionController {
    mode: Mode,
    gesture: TextGesture,
    current_stroke: Vec<Vec2>,
    drawing: bool,
    brush_color: Color,
    brush_width: f32,
    font: FontId,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            mode: Mode::Draw,
            gesture: TextGesture::Idle,
            current_stroke: Vec::new(),
            drawing: false,
            brush_color: Color::rgb(0xa8, 0x55, 0xf7),
            brush_width: 8.0,
            font: FontId::Classic,
        }
    }
}

impl InteractionController {
    /// Create a controller in draw mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tool mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current text-mode sub-state
    pub fn gesture(&self) -> &TextGesture {
        &self.gesture
    }

    /// Current brush color
    pub fn brush_color(&self) -> Color {
        self.brush_color
    }

    /// Current brush width in canvas pixels
    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    /// Current font for new text
    pub fn font(&self) -> FontId {
        self.font
    }

    /// The object under composition and its pending buffer, if any
    pub fn composing(&self) -> Option<(TextId, &str)> {
        match &self.gesture {
            TextGesture::Composing { id, buffer } => Some((*id, buffer.as_str())),
            _ => None,
        }
    }

    /// The selected (or dragged/pinched) object, if any
    pub fn selected(&self) -> Option<TextId> {
        match &self.gesture {
            TextGesture::Selected { id }
            | TextGesture::Dragging { id, .. }
            | TextGesture::Pinching { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Switch tool mode. Leaving text mode finalizes any composition and
    /// clears the selection.
    pub fn set_mode(&mut self, mode: Mode, artwork: &mut ArtworkModel) {
        if self.mode == Mode::Text && mode != Mode::Text {
            self.finish_composition(artwork);
            self.gesture = TextGesture::Idle;
        }
        if mode != Mode::Draw {
            self.drawing = false;
            self.current_stroke.clear();
        }
        debug!("Mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Set the brush color. In text mode the color also applies to the
    /// composing object, else to the selected one.
    pub fn set_color(&mut self, color: Color, artwork: &mut ArtworkModel) {
        self.brush_color = color;
        if let Some(id) = self.composing().map(|(id, _)| id).or_else(|| self.selected()) {
            if let Some(text) = artwork.text_mut(id) {
                text.color = color;
            }
        }
    }

    /// Set the brush width for new strokes
    pub fn set_brush_width(&mut self, width: f32) {
        self.brush_width = width.max(1.0);
    }

    /// Set the font for new text. Also applies to the composing object, else
    /// to the selected one.
    pub fn set_font(&mut self, font: FontId, artwork: &mut ArtworkModel) {
        self.font = font;
        if let Some(id) = self.composing().map(|(id, _)| id).or_else(|| self.selected()) {
            if let Some(text) = artwork.text_mut(id) {
                text.font = font;
            }
        }
    }

    /// Single-touch down, in canvas space.
    pub fn pointer_down(
        &mut self,
        point: Vec2,
        artwork: &mut ArtworkModel,
        measurer: &dyn TextMeasurer,
    ) {
        match self.mode {
            Mode::Draw => {
                self.drawing = true;
                self.current_stroke.clear();
                self.current_stroke.push(point);
            }
            Mode::Text => self.text_tap(point, artwork, measurer),
            Mode::Settings => {}
        }
    }

    /// Single-touch move.
    pub fn pointer_move(&mut self, point: Vec2, artwork: &mut ArtworkModel) {
        match self.mode {
            Mode::Draw => {
                if self.drawing {
                    self.current_stroke.push(point);
                }
            }
            Mode::Text => {
                if let TextGesture::Dragging { id, grab_offset } = self.gesture {
                    if let Some(text) = artwork.text_mut(id) {
                        text.position = point - grab_offset;
                    }
                }
            }
            Mode::Settings => {}
        }
    }

    /// Touch released.
    ///
    /// In draw mode this finalizes the in-progress point sequence: two or
    /// more points become a stroke, fewer produce nothing (a tap is not a
    /// stroke).
    pub fn pointer_up(&mut self, artwork: &mut ArtworkModel) {
        match self.mode {
            Mode::Draw => {
                if self.drawing && self.current_stroke.len() >= 2 {
                    artwork.append_stroke(Stroke {
                        points: std::mem::take(&mut self.current_stroke),
                        color: self.brush_color,
                        width: self.brush_width,
                    });
                }
                self.drawing = false;
                self.current_stroke.clear();
            }
            Mode::Text => match self.gesture {
                TextGesture::Dragging { id, .. } | TextGesture::Pinching { id, .. } => {
                    self.gesture = TextGesture::Selected { id };
                }
                _ => {}
            },
            Mode::Settings => {}
        }
    }

    /// Two-finger gesture began while an object is active.
    pub fn pinch_begin(&mut self, distance: f32, angle_deg: f32, artwork: &ArtworkModel) {
        if self.mode != Mode::Text || distance <= 0.0 {
            return;
        }
        let Some(id) = self.selected() else { return };
        let Some(text) = artwork.text(id) else { return };
        self.gesture = TextGesture::Pinching {
            id,
            start: PinchStart {
                distance,
                angle_deg,
                scale: text.scale,
                rotation_deg: text.rotation_deg,
            },
        };
    }

    /// Two-finger gesture update: recompute scale and rotation from the
    /// start snapshot. Scale clamps to [[`MIN_PINCH_SCALE`],
    /// [`MAX_PINCH_SCALE`]]; rotation is unbounded.
    pub fn pinch_update(&mut self, distance: f32, angle_deg: f32, artwork: &mut ArtworkModel) {
        let TextGesture::Pinching { id, start } = &self.gesture else {
            return;
        };
        let Some(text) = artwork.text_mut(*id) else {
            return;
        };
        text.scale =
            (start.scale * distance / start.distance).clamp(MIN_PINCH_SCALE, MAX_PINCH_SCALE);
        text.rotation_deg = start.rotation_deg + (angle_deg - start.angle_deg);
    }

    /// Append a character to the composition buffer.
    pub fn push_char(&mut self, c: char) {
        if let TextGesture::Composing { buffer, .. } = &mut self.gesture {
            buffer.push(c);
        }
    }

    /// Remove the last character of the composition buffer.
    pub fn backspace(&mut self) {
        if let TextGesture::Composing { buffer, .. } = &mut self.gesture {
            buffer.pop();
        }
    }

    /// Replace the composition buffer.
    pub fn set_buffer(&mut self, content: &str) {
        if let TextGesture::Composing { buffer, .. } = &mut self.gesture {
            buffer.clear();
            buffer.push_str(content);
        }
    }

    /// Commit or discard the current composition: a non-empty trimmed buffer
    /// persists (and the object stays selected); an empty one removes the
    /// object.
    pub fn finish_composition(&mut self, artwork: &mut ArtworkModel) {
        match std::mem::replace(&mut self.gesture, TextGesture::Idle) {
            TextGesture::Composing { id, buffer } => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    debug!("Discarding empty composition on text {}", id);
                    artwork.remove_text(id);
                } else {
                    if let Some(text) = artwork.text_mut(id) {
                        text.text = trimmed.to_string();
                    }
                    self.gesture = TextGesture::Selected { id };
                }
            }
            other => self.gesture = other,
        }
    }

    /// Abandon the current composition, removing the object regardless of
    /// buffer content.
    pub fn cancel_composition(&mut self, artwork: &mut ArtworkModel) {
        match std::mem::replace(&mut self.gesture, TextGesture::Idle) {
            TextGesture::Composing { id, .. } => {
                artwork.remove_text(id);
            }
            other => self.gesture = other,
        }
    }

    /// Delete the selected object.
    pub fn delete_selected(&mut self, artwork: &mut ArtworkModel) {
        if let Some(id) = self.selected() {
            artwork.remove_text(id);
            self.gesture = TextGesture::Idle;
        }
    }

    /// Text-mode tap: select-and-grab an existing object, or place a new one
    /// and start composing. Never two simultaneous active edit targets:
    /// acting on a different object first commits or discards the current
    /// composition.
    fn text_tap(&mut self, point: Vec2, artwork: &mut ArtworkModel, measurer: &dyn TextMeasurer) {
        match artwork.hit_test_text(point, measurer) {
            Some(hit) => {
                let composing_id = self.composing().map(|(id, _)| id);
                if composing_id == Some(hit) {
                    // Tapping the composing object keeps composing
                    return;
                }
                if composing_id.is_some() {
                    self.finish_composition(artwork);
                }
                // The hit object may have been the discarded composition
                if let Some(text) = artwork.text(hit) {
                    self.gesture = TextGesture::Dragging {
                        id: hit,
                        grab_offset: point - text.position,
                    };
                }
            }
            None => {
                self.finish_composition(artwork);
                let id = artwork.add_text(point, self.brush_color, self.font);
                debug!("Composing new text {} at {:?}", id, point);
                self.gesture = TextGesture::Composing {
                    id,
                    buffer: String::new(),
                };
            }
        }
    }
}
