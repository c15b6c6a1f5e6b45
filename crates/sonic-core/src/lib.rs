//! SonicCanvas Core - Domain Model and Audio Pipeline
//!
//! This crate contains the domain model for SonicCanvas, including:
//! - Artwork model (strokes and text objects)
//! - Audio capture, spectrum analysis and per-tick feature extraction
//! - The feature -> visual-effect mapping engine
//! - The mode and gesture state machine
//! - Canvas and audio configuration

#![warn(missing_docs)]

pub use glam::Vec2;

pub mod artwork;
pub mod audio;
pub mod config;
pub mod interaction;
pub mod mapping;

// --- Re-exports grouped by category ---

// Artwork
pub use artwork::{
    ArtworkModel, Color, FontId, Stroke, TextId, TextMeasurer, TextObject, TEXT_BASE_SIZE,
    TEXT_HIT_PADDING,
};

// Audio System
pub use audio::analyzer::SpectrumAnalyzer;
pub use audio::capture::{CaptureError, SpectrumSource};
#[cfg(feature = "audio")]
pub use audio::capture::CaptureSession;
#[cfg(any(test, feature = "mock-audio"))]
pub use audio::capture::MockSource;
pub use audio::features::{
    AudioFeatures, AudioFrame, FeatureExtractor, FeatureName, OnsetState, WAVEFORM_LEN,
};

// Configuration
pub use config::{AudioConfig, CanvasConfig};

// Interaction
pub use interaction::{InteractionController, Mode, PinchStart, TextGesture, Viewport};

// Mapping
pub use mapping::{ChannelBank, EffectChannel, EffectKey, EffectParams, GLOW_BASELINE};
