//! CSS-filter-equivalent color transforms.
//!
//! The reactive stroke pass composes `brightness() saturate() contrast()
//! hue-rotate()` exactly like a 2D-canvas filter string. Each primitive is a
//! 4x5 color matrix (the SVG feColorMatrix definitions); composition applies
//! them left to right, and the composed matrix is applied per pixel to the
//! stroke layer.

use tiny_skia::Pixmap;

/// A 4x5 color matrix: rows are output R, G, B, A; the fifth column is a
/// constant offset in normalized (0..1) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    m: [f32; 20],
}

impl ColorMatrix {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            m: [
                1.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    /// `brightness(v)`: scales all color channels
    pub fn brightness(v: f32) -> Self {
        Self {
            m: [
                v, 0.0, 0.0, 0.0, 0.0, //
                0.0, v, 0.0, 0.0, 0.0, //
                0.0, 0.0, v, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    /// `contrast(c)`: scales color channels about mid-gray
    pub fn contrast(c: f32) -> Self {
        let t = 0.5 - 0.5 * c;
        Self {
            m: [
                c, 0.0, 0.0, 0.0, t, //
                0.0, c, 0.0, 0.0, t, //
                0.0, 0.0, c, 0.0, t, //
                0.0, 0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    /// `saturate(s)`: interpolates between luminance gray and the source
    pub fn saturate(s: f32) -> Self {
        Self {
            m: [
                0.213 + 0.787 * s,
                0.715 - 0.715 * s,
                0.072 - 0.072 * s,
                0.0,
                0.0,
                0.213 - 0.213 * s,
                0.715 + 0.285 * s,
                0.072 - 0.072 * s,
                0.0,
                0.0,
                0.213 - 0.213 * s,
                0.715 - 0.715 * s,
                0.072 + 0.928 * s,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ],
        }
    }

    /// `hue-rotate(deg)`
    pub fn hue_rotate(degrees: f32) -> Self {
        let rad = degrees.to_radians();
        let (sin, cos) = rad.sin_cos();
        Self {
            m: [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
                0.0,
                0.0,
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
                0.0,
                0.0,
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ],
        }
    }

    /// Compose so that `self` is applied first, then `next`.
    pub fn then(&self, next: &ColorMatrix) -> ColorMatrix {
        let a = &next.m;
        let b = &self.m;
        let mut out = [0.0f32; 20];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[row * 5 + k] * b[k * 5 + col];
                }
                out[row * 5 + col] = sum;
            }
            let mut offset = a[row * 5 + 4];
            for k in 0..4 {
                offset += a[row * 5 + k] * b[k * 5 + 4];
            }
            out[row * 5 + 4] = offset;
        }
        ColorMatrix { m: out }
    }

    /// Whether this matrix is (numerically) the identity
    pub fn is_identity(&self) -> bool {
        let id = ColorMatrix::identity();
        self.m
            .iter()
            .zip(id.m.iter())
            .all(|(a, b)| (a - b).abs() < 1e-6)
    }

    /// Transform one straight-alpha RGBA value in normalized (0..1) units,
    /// clamping the result.
    pub fn apply_rgba(&self, rgba: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            let m = &self.m[row * 5..row * 5 + 5];
            *slot = (m[0] * rgba[0] + m[1] * rgba[1] + m[2] * rgba[2] + m[3] * rgba[3] + m[4])
                .clamp(0.0, 1.0);
        }
        out
    }

    /// Apply per pixel. The pixmap's premultiplied pixels are demultiplied,
    /// transformed in straight alpha, then re-premultiplied.
    pub fn apply(&self, pixmap: &mut Pixmap) {
        if self.is_identity() {
            return;
        }
        for pixel in pixmap.pixels_mut() {
            if pixel.alpha() == 0 {
                continue;
            }
            let straight = pixel.demultiply();
            let rgba = [
                straight.red() as f32 / 255.0,
                straight.green() as f32 / 255.0,
                straight.blue() as f32 / 255.0,
                straight.alpha() as f32 / 255.0,
            ];
            let out = self.apply_rgba(rgba);
            let color = tiny_skia::ColorU8::from_rgba(
                (out[0] * 255.0 + 0.5) as u8,
                (out[1] * 255.0 + 0.5) as u8,
                (out[2] * 255.0 + 0.5) as u8,
                (out[3] * 255.0 + 0.5) as u8,
            );
            *pixel = color.premultiply();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    fn close(a: [f32; 4], b: [f32; 4], tolerance: f32) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < tolerance)
    }

    #[test]
    fn test_identity_passes_through() {
        let m = ColorMatrix::identity();
        assert!(m.is_identity());
        assert_eq!(m.apply_rgba([0.2, 0.4, 0.6, 1.0]), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn test_neutral_primitives_are_identity() {
        assert!(ColorMatrix::brightness(1.0).is_identity());
        assert!(ColorMatrix::contrast(1.0).is_identity());
        assert!(ColorMatrix::saturate(1.0).is_identity());
        assert!(ColorMatrix::hue_rotate(0.0).is_identity());
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        let m = ColorMatrix::brightness(2.0);
        let out = m.apply_rgba([0.25, 0.6, 0.0, 1.0]);
        assert!(close(out, [0.5, 1.0, 0.0, 1.0], 1e-5));
    }

    #[test]
    fn test_saturate_zero_is_luminance_gray() {
        let m = ColorMatrix::saturate(0.0);
        let out = m.apply_rgba(RED);
        assert!((out[0] - 0.213).abs() < 1e-3);
        assert!((out[0] - out[1]).abs() < 1e-5);
        assert!((out[1] - out[2]).abs() < 1e-5);
    }

    #[test]
    fn test_hue_rotate_red_toward_green() {
        // 120 degrees maps pure red near pure green
        let m = ColorMatrix::hue_rotate(120.0);
        let out = m.apply_rgba(RED);
        assert!(out[1] > 0.8, "green should dominate, got {:?}", out);
        assert!(out[0] < 0.2);
        assert!(out[2] < 0.2);
    }

    #[test]
    fn test_hue_rotate_full_circle_is_identity() {
        let m = ColorMatrix::hue_rotate(360.0);
        let out = m.apply_rgba([0.3, 0.5, 0.7, 1.0]);
        assert!(close(out, [0.3, 0.5, 0.7, 1.0], 1e-3));
    }

    #[test]
    fn test_contrast_fixes_mid_gray() {
        let m = ColorMatrix::contrast(1.7);
        let out = m.apply_rgba([0.5, 0.5, 0.5, 1.0]);
        assert!(close(out, [0.5, 0.5, 0.5, 1.0], 1e-5));

        // Values above mid-gray move up, below move down
        let out = m.apply_rgba([0.7, 0.3, 0.5, 1.0]);
        assert!(out[0] > 0.7);
        assert!(out[1] < 0.3);
    }

    #[test]
    fn test_composition_order() {
        // brightness(0.5) then contrast(2): 1.0 -> 0.5 -> 0.5
        // contrast(2) then brightness(0.5): 1.0 -> 1.0 (clamped later) ...
        // use an unclamped-safe input instead: 0.8
        let bc = ColorMatrix::brightness(0.5).then(&ColorMatrix::contrast(2.0));
        let out = bc.apply_rgba([0.8, 0.8, 0.8, 1.0]);
        // 0.8 * 0.5 = 0.4; contrast: 0.4 * 2 - 0.5 = 0.3
        assert!(close(out, [0.3, 0.3, 0.3, 1.0], 1e-5));

        let cb = ColorMatrix::contrast(2.0).then(&ColorMatrix::brightness(0.5));
        let out = cb.apply_rgba([0.8, 0.8, 0.8, 1.0]);
        // contrast: 0.8 * 2 - 0.5 = 1.1; brightness: 0.55
        assert!(close(out, [0.55, 0.55, 0.55, 1.0], 1e-5));
    }

    #[test]
    fn test_apply_to_pixmap() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        ColorMatrix::hue_rotate(120.0).apply(&mut pixmap);
        let pixel = pixmap.pixels()[0].demultiply();
        assert!(pixel.green() > 200);
        assert!(pixel.red() < 60);
    }
}
