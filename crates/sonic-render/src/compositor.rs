//! Mirror output compositor.
//!
//! Letterboxes the active portrait surface into a fixed 16:9 landscape
//! target: full height, centered horizontally, black bars on both sides.
//! Runs once per tick while mirroring is active.

use crate::surface::CanvasSurface;
use crate::{RenderError, Result};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

/// Mirror target width
pub const MIRROR_WIDTH: u32 = 1920;

/// Mirror target height
pub const MIRROR_HEIGHT: u32 = 1080;

/// Compute the letterboxed placement of `source` inside `target`:
/// `(draw_width, draw_height, offset_x, offset_y)`.
///
/// The source is drawn at full target height; 9:16 content inside a 16:9
/// frame is always narrower than the frame, so the bars land on the sides.
pub fn letterbox_rect(source: (u32, u32), target: (u32, u32)) -> (f32, f32, f32, f32) {
    let source_aspect = source.0 as f32 / source.1 as f32;
    let draw_height = target.1 as f32;
    let draw_width = draw_height * source_aspect;
    let offset_x = (target.0 as f32 - draw_width) / 2.0;
    (draw_width, draw_height, offset_x, 0.0)
}

/// Owns the fixed-size mirror target.
pub struct Letterbox {
    target: Pixmap,
}

impl Letterbox {
    /// Allocate the 1920x1080 mirror target
    pub fn new() -> Result<Self> {
        let target =
            Pixmap::new(MIRROR_WIDTH, MIRROR_HEIGHT).ok_or(RenderError::InvalidSurfaceSize {
                width: MIRROR_WIDTH,
                height: MIRROR_HEIGHT,
            })?;
        Ok(Self { target })
    }

    /// Copy `source` scaled into the centered letterbox rect over black.
    pub fn composite(&mut self, source: &CanvasSurface) {
        self.target.fill(tiny_skia::Color::BLACK);
        if source.width() == 0 || source.height() == 0 {
            return;
        }

        let (draw_width, draw_height, offset_x, offset_y) = letterbox_rect(
            (source.width(), source.height()),
            (MIRROR_WIDTH, MIRROR_HEIGHT),
        );
        let transform = Transform::from_scale(
            draw_width / source.width() as f32,
            draw_height / source.height() as f32,
        )
        .post_concat(Transform::from_translate(offset_x, offset_y));

        self.target.draw_pixmap(
            0,
            0,
            source.pixmap().as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..Default::default()
            },
            transform,
            None,
        );
    }

    /// The composited mirror frame
    pub fn target(&self) -> &Pixmap {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_core::{CanvasConfig, Color};

    #[test]
    fn test_letterbox_rect_for_portrait_canvas() {
        let (draw_width, draw_height, offset_x, offset_y) =
            letterbox_rect((1080, 1920), (1920, 1080));
        assert!((draw_width - 607.5).abs() < 1e-3);
        assert_eq!(draw_height, 1080.0);
        assert!((offset_x - 656.25).abs() < 1e-3);
        assert_eq!(offset_y, 0.0);
    }

    #[test]
    fn test_composite_centers_content_over_black() {
        let config = CanvasConfig {
            width: 90,
            height: 160,
            background: Color::rgb(200, 50, 50),
        };
        let surface = crate::CanvasSurface::new(&config).unwrap();
        let mut letterbox = Letterbox::new().unwrap();
        letterbox.composite(&surface);

        let target = letterbox.target();
        let pixel_at = |x: u32, y: u32| target.pixels()[(y * MIRROR_WIDTH + x) as usize];

        // Center carries the (scaled) canvas background
        let center = pixel_at(MIRROR_WIDTH / 2, MIRROR_HEIGHT / 2).demultiply();
        assert!(center.red() > 150);

        // Far left and right columns are bars
        let left = pixel_at(10, MIRROR_HEIGHT / 2).demultiply();
        let right = pixel_at(MIRROR_WIDTH - 10, MIRROR_HEIGHT / 2).demultiply();
        assert_eq!((left.red(), left.green(), left.blue()), (0, 0, 0));
        assert_eq!((right.red(), right.green(), right.blue()), (0, 0, 0));

        // Top edge inside the content band is not a bar
        let top_center = pixel_at(MIRROR_WIDTH / 2, 2).demultiply();
        assert!(top_center.red() > 150);
    }
}
