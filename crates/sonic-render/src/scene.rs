//! The modulated scene renderer.
//!
//! One draw routine serves both surfaces: with no effect parameters it
//! renders neutrally (this is how the persistent surface materializes the
//! artwork and reflects edits); with parameters it renders the reactive
//! frame onto the ephemeral surface. The artwork itself is read-only here —
//! modulation never touches the model.
//!
//! Draw order is the painter's algorithm over creation order: background,
//! then strokes (glow under crisp, color-filtered as a group), then text
//! (each with its own glow and hue rotation), exactly the stacking the
//! persistent canvas shows.

use crate::blur::blur;
use crate::filters::ColorMatrix;
use crate::surface::{to_skia, CanvasSurface};
use crate::text::TextShaper;
use glam::Vec2;
use sonic_core::{
    ArtworkModel, CanvasConfig, EffectParams, Stroke, TextId, TextMeasurer, WAVEFORM_LEN,
};
use std::time::Duration;
use tiny_skia::{
    LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};

/// Caret blink phase divisor: the caret is visible while
/// `sin(elapsed_ms / 300)` is positive.
pub const CARET_BLINK_MS: f64 = 300.0;

/// Caret geometry in text-local units: drawn this far after the measured
/// text end, spanning most of the line height.
const CARET_GAP: f32 = 4.0;
const CARET_TOP: f32 = -50.0;
const CARET_WIDTH: f32 = 3.0;
const CARET_HEIGHT: f32 = 60.0;

/// Whether the caret is on at `elapsed` time into composition.
pub fn caret_visible(elapsed: Duration) -> bool {
    (elapsed.as_secs_f64() * 1000.0 / CARET_BLINK_MS).sin() > 0.0
}

/// The text object currently being composed, as the renderer needs it.
#[derive(Debug, Clone, Copy)]
pub struct ComposingText<'a> {
    /// Object under composition
    pub id: TextId,
    /// Pending content (drawn instead of the object's committed text)
    pub buffer: &'a str,
    /// Current blink phase
    pub caret_on: bool,
}

/// Everything that varies per render call.
///
/// `effects: None` means neutral (identity) rendering; this collapses the
/// static and reactive draw paths into one routine.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput<'a> {
    /// Effect parameters, absent for neutral rendering
    pub effects: Option<&'a EffectParams>,
    /// This tick's waveform buffer for squiggle displacement
    pub waveform: Option<&'a [f32; WAVEFORM_LEN]>,
    /// Composition state, if a text is being edited
    pub composing: Option<ComposingText<'a>>,
}

impl<'a> FrameInput<'a> {
    /// Neutral input: no effects, no waveform, no composition
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Displace a stroke point perpendicular to its local segment direction.
///
/// The wave sample is taken from the point's position along the stroke, not
/// from time, so a static stroke vibrates in place as the buffer updates.
pub(crate) fn displaced(prev: Vec2, point: Vec2, wave: f32, amount: f32) -> Vec2 {
    let delta = point - prev;
    let len = delta.length();
    if len <= 0.0 {
        return point;
    }
    let perpendicular = Vec2::new(-delta.y, delta.x) / len;
    point + perpendicular * wave * amount
}

/// Renders the artwork onto a surface, optionally modulated.
pub struct SceneRenderer {
    config: CanvasConfig,
    shaper: TextShaper,
}

impl SceneRenderer {
    /// Create a renderer for the given canvas geometry
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            shaper: TextShaper::new(),
        }
    }

    /// The shaper, usable as the hit-test measurer
    pub fn measurer(&self) -> &dyn TextMeasurer {
        &self.shaper
    }

    /// Draw the whole artwork onto `surface`.
    pub fn render(&self, surface: &mut CanvasSurface, artwork: &ArtworkModel, frame: &FrameInput) {
        let params = frame.effects.copied().unwrap_or_default();
        surface.clear();

        let center = self.config.center();
        // Rotate and scale about the canvas center, then shake/bounce.
        // Composed left to right the way sequential canvas transforms stack.
        let global = Transform::from_translate(center.x, center.y)
            .pre_concat(Transform::from_rotate(params.rotation_deg()))
            .pre_concat(Transform::from_scale(params.scale(), params.scale()))
            .pre_concat(Transform::from_translate(
                -center.x + params.x_offset(),
                -center.y + params.y_offset(),
            ));

        self.render_strokes(surface, artwork, &params, frame, global);
        self.render_texts(surface, artwork, &params, frame, global);
    }

    fn render_strokes(
        &self,
        surface: &mut CanvasSurface,
        artwork: &ArtworkModel,
        params: &EffectParams,
        frame: &FrameInput,
        global: Transform,
    ) {
        if artwork.strokes().is_empty() {
            return;
        }
        // Strokes draw into their own layer so the color-filter stack covers
        // them as a group and never bleeds into text
        let Some(mut layer) = Pixmap::new(surface.width(), surface.height()) else {
            return;
        };
        let Some(mut scratch) = Pixmap::new(surface.width(), surface.height()) else {
            return;
        };

        let squiggle = params.squiggle();
        let glow = params.glow();
        let zero_wave = [0.0f32; WAVEFORM_LEN];
        let waveform = frame.waveform.unwrap_or(&zero_wave);

        for stroke in artwork.strokes() {
            let Some(path) = build_stroke_path(stroke, squiggle, waveform) else {
                continue;
            };
            let mut paint = Paint::default();
            paint.set_color(to_skia(stroke.color));
            paint.anti_alias = true;

            let style = tiny_skia::Stroke {
                width: stroke.width * params.line_width(),
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };

            if glow >= 0.5 {
                // Glow sits beneath the crisp pass; blur happens in device
                // space like a canvas shadow
                scratch.data_mut().fill(0);
                scratch.stroke_path(&path, &paint, &style, global, None);
                blur(&mut scratch, glow);
                layer.draw_pixmap(
                    0,
                    0,
                    scratch.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }
            layer.stroke_path(&path, &paint, &style, global, None);
        }

        let filter = ColorMatrix::brightness(params.brightness())
            .then(&ColorMatrix::saturate(params.saturation()))
            .then(&ColorMatrix::contrast(params.contrast()))
            .then(&ColorMatrix::hue_rotate(params.hue_shift_deg()));
        filter.apply(&mut layer);

        surface.pixmap_mut().draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn render_texts(
        &self,
        surface: &mut CanvasSurface,
        artwork: &ArtworkModel,
        params: &EffectParams,
        frame: &FrameInput,
        global: Transform,
    ) {
        if artwork.texts().is_empty() {
            return;
        }
        let Some(mut glow_scratch) = Pixmap::new(surface.width(), surface.height()) else {
            return;
        };

        for text in artwork.texts() {
            let composing_this = frame.composing.filter(|c| c.id == text.id);
            let content = composing_this.map(|c| c.buffer).unwrap_or(&text.text);
            if content.is_empty() && composing_this.is_none() {
                continue;
            }

            // Object scale multiplies with the effect; rotation is additive
            let scale = text.scale * params.text_scale();
            let rotation = text.rotation_deg + params.text_rotation_deg();
            let local = global
                .pre_concat(Transform::from_translate(text.position.x, text.position.y))
                .pre_concat(Transform::from_scale(scale, scale))
                .pre_concat(Transform::from_rotate(rotation));

            if !content.is_empty() {
                if let Some(shaped) = self.shaper.shape(content, text.font, text.color) {
                    let placement = local.pre_concat(Transform::from_translate(
                        shaped.left,
                        shaped.top,
                    ));

                    // Texts hue-rotate independently of the stroke filter
                    let hue = params.hue_shift_deg();
                    let tinted;
                    let glyphs = if hue != 0.0 {
                        let mut copy = shaped.pixmap.clone();
                        ColorMatrix::hue_rotate(hue).apply(&mut copy);
                        tinted = copy;
                        &tinted
                    } else {
                        &shaped.pixmap
                    };

                    let text_glow = params.text_glow();
                    if text_glow >= 0.5 {
                        glow_scratch.data_mut().fill(0);
                        glow_scratch.draw_pixmap(
                            0,
                            0,
                            glyphs.as_ref(),
                            &PixmapPaint {
                                quality: tiny_skia::FilterQuality::Bilinear,
                                ..Default::default()
                            },
                            placement,
                            None,
                        );
                        blur(&mut glow_scratch, text_glow);
                        surface.pixmap_mut().draw_pixmap(
                            0,
                            0,
                            glow_scratch.as_ref(),
                            &PixmapPaint::default(),
                            Transform::identity(),
                            None,
                        );
                    }

                    surface.pixmap_mut().draw_pixmap(
                        0,
                        0,
                        glyphs.as_ref(),
                        &PixmapPaint {
                            quality: tiny_skia::FilterQuality::Bilinear,
                            ..Default::default()
                        },
                        placement,
                        None,
                    );
                }
            }

            // Blinking caret right after the measured end of the buffer
            if let Some(composing) = composing_this {
                if composing.caret_on {
                    let advance = self.shaper.advance_width(content, text.font);
                    if let Some(rect) = Rect::from_xywh(
                        advance + CARET_GAP,
                        CARET_TOP,
                        CARET_WIDTH,
                        CARET_HEIGHT,
                    ) {
                        let mut paint = Paint::default();
                        paint.set_color(to_skia(text.color));
                        paint.anti_alias = true;
                        surface.pixmap_mut().fill_rect(rect, &paint, local, None);
                    }
                }
            }
        }
    }
}

/// Build a stroke's path, displacing every point after the first
/// perpendicular to the local segment direction by the waveform sample at
/// the point's position along the stroke.
fn build_stroke_path(
    stroke: &Stroke,
    squiggle: f32,
    waveform: &[f32; WAVEFORM_LEN],
) -> Option<tiny_skia::Path> {
    if stroke.points.len() < 2 {
        return None;
    }
    let mut builder = PathBuilder::new();
    let first = stroke.points[0];
    builder.move_to(first.x, first.y);

    let total = stroke.points.len();
    for (i, &point) in stroke.points.iter().enumerate().skip(1) {
        let target = if squiggle > 0.0 {
            let wave_index =
                ((i as f32 / total as f32) * WAVEFORM_LEN as f32) as usize;
            let wave = waveform[wave_index.min(WAVEFORM_LEN - 1)];
            displaced(stroke.points[i - 1], point, wave, squiggle)
        } else {
            point
        };
        builder.line_to(target.x, target.y);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_core::Color;

    fn small_config() -> CanvasConfig {
        CanvasConfig {
            width: 64,
            height: 96,
            background: Color::rgb(0, 0, 0),
        }
    }

    fn diagonal_stroke() -> Stroke {
        Stroke {
            points: vec![Vec2::new(10.0, 10.0), Vec2::new(50.0, 80.0)],
            color: Color::rgb(255, 0, 0),
            width: 4.0,
        }
    }

    fn lit_pixels(surface: &CanvasSurface) -> usize {
        surface
            .pixmap()
            .pixels()
            .iter()
            .filter(|p| p.red() > 10 || p.green() > 10 || p.blue() > 10)
            .count()
    }

    #[test]
    fn test_caret_blink_phase() {
        assert!(caret_visible(Duration::from_millis(300)));
        assert!(!caret_visible(Duration::from_millis(1200)));
        // The phase toggles over a full cycle
        let states: Vec<bool> = (0..8)
            .map(|i| caret_visible(Duration::from_millis(i * 400)))
            .collect();
        assert!(states.iter().any(|&v| v));
        assert!(states.iter().any(|&v| !v));
    }

    #[test]
    fn test_displacement_is_perpendicular() {
        // Horizontal segment: displacement is purely vertical
        let out = displaced(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 0.5, 8.0);
        assert!((out.x - 10.0).abs() < 1e-5);
        assert!((out.y - 4.0).abs() < 1e-5);

        // Zero-length segment: no displacement
        let out = displaced(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0), 0.9, 20.0);
        assert_eq!(out, Vec2::new(5.0, 5.0));

        // Zero wave: no displacement
        let out = displaced(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0), 0.0, 20.0);
        assert_eq!(out, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_neutral_render_draws_strokes() {
        let config = small_config();
        let renderer = SceneRenderer::new(config);
        let mut surface = CanvasSurface::new(&config).unwrap();
        let mut artwork = ArtworkModel::new();
        artwork.append_stroke(diagonal_stroke());

        renderer.render(&mut surface, &artwork, &FrameInput::neutral());
        assert!(lit_pixels(&surface) > 20, "stroke should light pixels");
    }

    #[test]
    fn test_render_does_not_mutate_artwork() {
        let config = small_config();
        let renderer = SceneRenderer::new(config);
        let mut surface = CanvasSurface::new(&config).unwrap();
        let mut artwork = ArtworkModel::new();
        artwork.append_stroke(diagonal_stroke());
        let before = artwork.clone();

        let mut params = EffectParams::default();
        params.set(sonic_core::EffectKey::Squiggle, 12.0);
        params.set(sonic_core::EffectKey::Scale, 1.1);
        let wave = [0.5f32; WAVEFORM_LEN];
        renderer.render(
            &mut surface,
            &artwork,
            &FrameInput {
                effects: Some(&params),
                waveform: Some(&wave),
                composing: None,
            },
        );
        assert_eq!(artwork, before);
    }

    #[test]
    fn test_offset_effect_moves_pixels() {
        let config = small_config();
        let renderer = SceneRenderer::new(config);
        let mut artwork = ArtworkModel::new();
        artwork.append_stroke(diagonal_stroke());

        let mut neutral_surface = CanvasSurface::new(&config).unwrap();
        renderer.render(&mut neutral_surface, &artwork, &FrameInput::neutral());

        let mut params = EffectParams::default();
        params.set(sonic_core::EffectKey::XOffset, 10.0);
        let mut shifted_surface = CanvasSurface::new(&config).unwrap();
        renderer.render(
            &mut shifted_surface,
            &artwork,
            &FrameInput {
                effects: Some(&params),
                ..Default::default()
            },
        );

        assert_ne!(
            neutral_surface.pixmap().data(),
            shifted_surface.pixmap().data(),
            "a horizontal offset must change the frame"
        );
    }

    #[test]
    fn test_caret_renders_without_fonts() {
        // An empty composing text draws only the caret; this must work even
        // on hosts with no fonts at all
        let config = small_config();
        let renderer = SceneRenderer::new(config);
        let mut surface = CanvasSurface::new(&config).unwrap();
        let mut artwork = ArtworkModel::new();
        let id = artwork.add_text(Vec2::new(20.0, 60.0), Color::rgb(0, 255, 0), sonic_core::FontId::Classic);

        renderer.render(
            &mut surface,
            &artwork,
            &FrameInput {
                composing: Some(ComposingText {
                    id,
                    buffer: "",
                    caret_on: true,
                }),
                ..Default::default()
            },
        );
        let with_caret = lit_pixels(&surface);
        assert!(with_caret > 0, "caret should be visible");

        renderer.render(
            &mut surface,
            &artwork,
            &FrameInput {
                composing: Some(ComposingText {
                    id,
                    buffer: "",
                    caret_on: false,
                }),
                ..Default::default()
            },
        );
        assert_eq!(lit_pixels(&surface), 0, "caret off phase draws nothing");
    }

    #[test]
    fn test_squiggle_changes_stroke_geometry() {
        let config = small_config();
        let renderer = SceneRenderer::new(config);
        let mut artwork = ArtworkModel::new();
        artwork.append_stroke(Stroke {
            points: (0..20)
                .map(|i| Vec2::new(8.0 + i as f32 * 2.0, 48.0))
                .collect(),
            color: Color::rgb(255, 255, 255),
            width: 2.0,
        });

        let wave = [1.0f32; WAVEFORM_LEN];
        let mut flat = CanvasSurface::new(&config).unwrap();
        renderer.render(&mut flat, &artwork, &FrameInput::neutral());

        let mut params = EffectParams::default();
        params.set(sonic_core::EffectKey::Squiggle, 10.0);
        let mut wavy = CanvasSurface::new(&config).unwrap();
        renderer.render(
            &mut wavy,
            &artwork,
            &FrameInput {
                effects: Some(&params),
                waveform: Some(&wave),
                composing: None,
            },
        );

        assert_ne!(flat.pixmap().data(), wavy.pixmap().data());
    }
}
