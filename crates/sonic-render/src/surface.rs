//! Render targets.
//!
//! The persistent surface (the artwork's visual materialization) and the
//! ephemeral reactive surface are two instances of the same [`CanvasSurface`]
//! type drawn by the same routine; nothing about the type distinguishes them.

use crate::{RenderError, Result};
use sonic_core::{CanvasConfig, Color};
use tiny_skia::Pixmap;

/// Convert a model color to a tiny-skia color at full opacity
pub(crate) fn to_skia(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255)
}

/// A canvas-sized pixel target with a background fill.
pub struct CanvasSurface {
    pixmap: Pixmap,
    background: Color,
}

impl CanvasSurface {
    /// Allocate a surface for the given canvas configuration
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        let pixmap =
            Pixmap::new(config.width, config.height).ok_or(RenderError::InvalidSurfaceSize {
                width: config.width,
                height: config.height,
            })?;
        let mut surface = Self {
            pixmap,
            background: config.background,
        };
        surface.clear();
        Ok(surface)
    }

    /// Fill the whole surface with its background color
    pub fn clear(&mut self) {
        self.pixmap.fill(to_skia(self.background));
    }

    /// Surface width in pixels
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Surface height in pixels
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The underlying pixmap
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutable access to the underlying pixmap
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_starts_cleared() {
        let config = CanvasConfig {
            width: 8,
            height: 8,
            background: Color::rgb(10, 20, 30),
        };
        let surface = CanvasSurface::new(&config).unwrap();
        let pixel = surface.pixmap().pixels()[0].demultiply();
        assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (10, 20, 30));
    }

    #[test]
    fn test_zero_size_is_an_error() {
        let config = CanvasConfig {
            width: 0,
            height: 8,
            background: Color::WHITE,
        };
        assert!(matches!(
            CanvasSurface::new(&config),
            Err(RenderError::InvalidSurfaceSize { .. })
        ));
    }
}
