//! Canvas and audio configuration.

use crate::artwork::Color;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Geometry and background of the drawing canvas.
///
/// The canvas is portrait (phone-shaped); the mirror target is a fixed
/// landscape surface that letterboxes this canvas (see sonic-render).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Background fill color
    pub background: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            background: Color::rgb(0x0a, 0x0a, 0x12),
        }
    }
}

impl CanvasConfig {
    /// Canvas center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Width / height aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Configuration for the spectrum analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate from the audio backend
    pub sample_rate: u32,
    /// FFT size (power of 2)
    pub fft_size: usize,
    /// Exponential smoothing factor for the magnitude spectrum (0.0 - 1.0)
    pub smoothing: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 2048,
            smoothing: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.width, 1080);
        assert_eq!(config.height, 1920);
        assert_eq!(config.background, Color::rgb(0x0a, 0x0a, 0x12));
        assert_eq!(config.center(), Vec2::new(540.0, 960.0));
        assert!((config.aspect_ratio() - 0.5625).abs() < 1e-6);
    }

    #[test]
    fn test_audio_defaults() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.fft_size, 2048);
        assert_eq!(config.smoothing, 0.3);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = CanvasConfig::default();
        let json = serde_json::to_string(&original).expect("Failed to serialize");
        let deserialized: CanvasConfig = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(original, deserialized);
    }
}
