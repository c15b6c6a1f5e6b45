//! SonicCanvas Render - software rasterization of the artwork model.
//!
//! This crate turns the domain model into pixels:
//! - [`CanvasSurface`]: the persistent and ephemeral render targets
//! - [`SceneRenderer`]: the single modulated draw routine (strokes + text)
//! - [`ColorMatrix`]: CSS-filter-equivalent color transforms
//! - [`TextShaper`]: text shaping/rasterization and metrics
//! - [`Letterbox`]: the fixed 16:9 mirror compositor

#![warn(missing_docs)]

use thiserror::Error;

mod blur;
pub mod compositor;
pub mod filters;
pub mod scene;
pub mod surface;
pub mod text;

pub use blur::blur;
pub use compositor::{letterbox_rect, Letterbox, MIRROR_HEIGHT, MIRROR_WIDTH};
pub use filters::ColorMatrix;
pub use scene::{caret_visible, ComposingText, FrameInput, SceneRenderer};
pub use surface::CanvasSurface;
pub use text::TextShaper;

/// Render crate errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// A surface dimension was zero
    #[error("invalid surface size {width}x{height}")]
    InvalidSurfaceSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
