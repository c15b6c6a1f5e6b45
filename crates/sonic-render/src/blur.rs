//! Approximate Gaussian blur for glow rendering.
//!
//! Glow is a blurred copy of a shape drawn beneath its crisp pass (the 2D
//! canvas `shadowBlur` treatment). Three box-blur passes over the
//! premultiplied pixels approximate a Gaussian; the box sizes follow the
//! standard boxes-for-Gaussian derivation. A `shadowBlur` radius corresponds
//! to roughly twice the Gaussian sigma.

use tiny_skia::Pixmap;

/// Blur a pixmap in place. Radii below half a pixel are a no-op.
pub fn blur(pixmap: &mut Pixmap, radius: f32) {
    if radius < 0.5 || pixmap.width() == 0 || pixmap.height() == 0 {
        return;
    }
    let sigma = radius * 0.5;
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;

    let mut front: Vec<u8> = pixmap.data().to_vec();
    let mut back = vec![0u8; front.len()];

    for box_radius in box_radii(sigma) {
        if box_radius == 0 {
            continue;
        }
        box_blur_horizontal(&front, &mut back, width, height, box_radius);
        box_blur_vertical(&back, &mut front, width, height, box_radius);
    }

    pixmap.data_mut().copy_from_slice(&front);
}

/// Three box sizes whose repeated application approximates a Gaussian of the
/// given sigma (W3C filter-effects derivation).
fn box_radii(sigma: f32) -> [usize; 3] {
    let n = 3.0f32;
    let w_ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;

    let m_ideal = (12.0 * sigma * sigma - n * (wl * wl) as f32 - 4.0 * n * wl as f32 - 3.0 * n)
        / (-4.0 * wl as f32 - 4.0);
    let m = m_ideal.round().clamp(0.0, n) as usize;

    let mut radii = [0usize; 3];
    for (i, radius) in radii.iter_mut().enumerate() {
        let size = if i < m { wl } else { wu };
        *radius = ((size - 1) / 2) as usize;
    }
    radii
}

fn box_blur_horizontal(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    for y in 0..height {
        let row = y * width * 4;
        let mut sums = [0u32; 4];

        // Prime the window with edge-clamped samples
        for x in -(radius as isize)..=(radius as isize) {
            let cx = x.clamp(0, width as isize - 1) as usize;
            for c in 0..4 {
                sums[c] += src[row + cx * 4 + c] as u32;
            }
        }

        for x in 0..width {
            for c in 0..4 {
                dst[row + x * 4 + c] = (sums[c] / window) as u8;
            }
            let leaving = (x as isize - radius as isize).clamp(0, width as isize - 1) as usize;
            let entering = (x + radius + 1).min(width - 1);
            for c in 0..4 {
                sums[c] += src[row + entering * 4 + c] as u32;
                sums[c] -= src[row + leaving * 4 + c] as u32;
            }
        }
    }
}

fn box_blur_vertical(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    let stride = width * 4;
    for x in 0..width {
        let col = x * 4;
        let mut sums = [0u32; 4];

        for y in -(radius as isize)..=(radius as isize) {
            let cy = y.clamp(0, height as isize - 1) as usize;
            for c in 0..4 {
                sums[c] += src[cy * stride + col + c] as u32;
            }
        }

        for y in 0..height {
            for c in 0..4 {
                dst[y * stride + col + c] = (sums[c] / window) as u8;
            }
            let leaving = (y as isize - radius as isize).clamp(0, height as isize - 1) as usize;
            let entering = (y + radius + 1).min(height - 1);
            for c in 0..4 {
                sums[c] += src[entering * stride + col + c] as u32;
                sums[c] -= src[leaving * stride + col + c] as u32;
            }
        }
    }
}
