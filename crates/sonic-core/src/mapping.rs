//! Mapping Engine - audio features to visual-effect parameters.
//!
//! Fourteen effect channels each bind one audio feature to one visual
//! parameter with an output range, a gain and an enable flag. Evaluation is
//! `min + clamp01(feature * amplify) * (max - min)`. Disabled channels are
//! absent from the output entirely; consumers resolve absent keys to defined
//! neutral defaults (absent scale is 1.0, absent glow is the baseline blur,
//! never zero).

use crate::audio::features::{AudioFeatures, FeatureName};
use serde::{Deserialize, Serialize};

/// Glow blur radius used when the glow channels are absent. This is also the
/// blur neutral rendering draws with — disabling glow does not mean no glow.
pub const GLOW_BASELINE: f32 = 15.0;

/// The visual parameters an effect channel can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKey {
    /// Uniform canvas scale about its center
    Scale,
    /// Canvas rotation about its center, degrees
    Rotation,
    /// Stroke hue rotation, degrees
    HueShift,
    /// Stroke brightness multiplier
    Brightness,
    /// Stroke saturation multiplier
    Saturation,
    /// Stroke contrast multiplier
    Contrast,
    /// Horizontal canvas shake, pixels
    XOffset,
    /// Vertical canvas bounce, pixels
    YOffset,
    /// Waveform-coupled perpendicular stroke displacement, pixels
    Squiggle,
    /// Stroke width multiplier
    LineWidth,
    /// Stroke glow blur radius, pixels
    Glow,
    /// Text scale multiplier (on top of each object's own scale)
    TextScale,
    /// Additive text rotation, degrees
    TextRotation,
    /// Text glow blur radius, pixels
    TextGlow,
}

impl EffectKey {
    /// All keys, in settings-panel order
    pub const ALL: [EffectKey; 14] = [
        EffectKey::Scale,
        EffectKey::Rotation,
        EffectKey::HueShift,
        EffectKey::Brightness,
        EffectKey::Saturation,
        EffectKey::Contrast,
        EffectKey::XOffset,
        EffectKey::YOffset,
        EffectKey::Squiggle,
        EffectKey::LineWidth,
        EffectKey::Glow,
        EffectKey::TextScale,
        EffectKey::TextRotation,
        EffectKey::TextGlow,
    ];
}

/// One configurable feature -> parameter binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectChannel {
    /// The audio feature driving this channel
    pub source: FeatureName,
    /// Output at feature 0
    pub min: f32,
    /// Output at saturated feature
    pub max: f32,
    /// Gain applied to the feature before saturation
    pub amplify: f32,
    /// Whether this channel contributes to the output at all
    pub enabled: bool,
    /// Display label for the settings panel
    pub label: String,
}

impl EffectChannel {
    fn new(source: FeatureName, min: f32, max: f32, amplify: f32, label: &str) -> Self {
        Self {
            source,
            min,
            max,
            amplify,
            enabled: true,
            label: label.to_string(),
        }
    }
}

/// Map a feature value through a channel's range and gain.
pub fn map_value(feature: f32, min: f32, max: f32, amplify: f32) -> f32 {
    min + (feature * amplify).clamp(0.0, 1.0) * (max - min)
}

/// The full table of effect channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBank {
    channels: [EffectChannel; 14],
}

impl Default for ChannelBank {
    fn default() -> Self {
        use FeatureName::*;
        Self {
            // Indexed by EffectKey::ALL order
            channels: [
                EffectChannel::new(Volume, 0.95, 1.12, 3.5, "Pulse/Scale"),
                EffectChannel::new(SpectralCentroid, -4.0, 4.0, 2.5, "Rotation"),
                EffectChannel::new(Pitch, -60.0, 60.0, 3.0, "Hue Shift"),
                EffectChannel::new(Volume, 0.85, 1.5, 3.5, "Brightness"),
                EffectChannel::new(MidFreq, 0.8, 2.0, 3.0, "Saturation"),
                EffectChannel::new(LowFreq, 0.9, 1.3, 2.5, "Contrast"),
                EffectChannel::new(SpectralFlux, -12.0, 12.0, 5.0, "Horizontal Shake"),
                EffectChannel::new(BassHit, -18.0, 18.0, 6.0, "Vertical Bounce"),
                EffectChannel::new(Volume, 0.0, 20.0, 4.5, "Line Squiggle"),
                EffectChannel::new(LowFreq, 0.7, 1.6, 3.5, "Line Thickness"),
                EffectChannel::new(HighFreq, 8.0, 50.0, 4.0, "Glow Intensity"),
                EffectChannel::new(Volume, 0.9, 1.25, 4.0, "Text/Emoji Scale"),
                EffectChannel::new(HighFreq, -8.0, 8.0, 3.0, "Text/Emoji Rotate"),
                EffectChannel::new(Volume, 5.0, 40.0, 4.0, "Text/Emoji Glow"),
            ],
        }
    }
}

impl ChannelBank {
    /// Create the default channel table
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel bound to `key`
    pub fn channel(&self, key: EffectKey) -> &EffectChannel {
        &self.channels[Self::index(key)]
    }

    /// Mutable access to the channel bound to `key`
    pub fn channel_mut(&mut self, key: EffectKey) -> &mut EffectChannel {
        &mut self.channels[Self::index(key)]
    }

    /// Iterate (key, channel) pairs in settings order
    pub fn iter(&self) -> impl Iterator<Item = (EffectKey, &EffectChannel)> {
        EffectKey::ALL.iter().copied().zip(self.channels.iter())
    }

    /// Evaluate all enabled channels against a feature snapshot.
    pub fn evaluate(&self, features: &AudioFeatures) -> EffectParams {
        let mut params = EffectParams::default();
        for (key, channel) in self.iter() {
            if !channel.enabled {
                continue;
            }
            let value = map_value(
                features.get(channel.source),
                channel.min,
                channel.max,
                channel.amplify,
            );
            params.set(key, value);
        }
        params
    }

    // Channels are stored in declaration order, which EffectKey::ALL mirrors
    fn index(key: EffectKey) -> usize {
        key as usize
    }
}

/// Per-tick effect parameters.
///
/// Keys evaluated from a disabled channel are absent, not zero; the accessor
/// methods resolve absence to the neutral defaults. `EffectParams::default()`
/// is fully neutral and is what non-reactive rendering uses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectParams {
    scale: Option<f32>,
    rotation: Option<f32>,
    hue_shift: Option<f32>,
    brightness: Option<f32>,
    saturation: Option<f32>,
    contrast: Option<f32>,
    x_offset: Option<f32>,
    y_offset: Option<f32>,
    squiggle: Option<f32>,
    line_width: Option<f32>,
    glow: Option<f32>,
    text_scale: Option<f32>,
    text_rotation: Option<f32>,
    text_glow: Option<f32>,
}

impl EffectParams {
    /// Raw lookup: `None` when the channel was disabled
    pub fn get(&self, key: EffectKey) -> Option<f32> {
        match key {
            EffectKey::Scale => self.scale,
            EffectKey::Rotation => self.rotation,
            EffectKey::HueShift => self.hue_shift,
            EffectKey::Brightness => self.brightness,
            EffectKey::Saturation => self.saturation,
            EffectKey::Contrast => self.contrast,
            EffectKey::XOffset => self.x_offset,
            EffectKey::YOffset => self.y_offset,
            EffectKey::Squiggle => self.squiggle,
            EffectKey::LineWidth => self.line_width,
            EffectKey::Glow => self.glow,
            EffectKey::TextScale => self.text_scale,
            EffectKey::TextRotation => self.text_rotation,
            EffectKey::TextGlow => self.text_glow,
        }
    }

    /// Set a parameter value
    pub fn set(&mut self, key: EffectKey, value: f32) {
        let slot = match key {
            EffectKey::Scale => &mut self.scale,
            EffectKey::Rotation => &mut self.rotation,
            EffectKey::HueShift => &mut self.hue_shift,
            EffectKey::Brightness => &mut self.brightness,
            EffectKey::Saturation => &mut self.saturation,
            EffectKey::Contrast => &mut self.contrast,
            EffectKey::XOffset => &mut self.x_offset,
            EffectKey::YOffset => &mut self.y_offset,
            EffectKey::Squiggle => &mut self.squiggle,
            EffectKey::LineWidth => &mut self.line_width,
            EffectKey::Glow => &mut self.glow,
            EffectKey::TextScale => &mut self.text_scale,
            EffectKey::TextRotation => &mut self.text_rotation,
            EffectKey::TextGlow => &mut self.text_glow,
        };
        *slot = Some(value);
    }

    /// Canvas scale (neutral 1.0)
    pub fn scale(&self) -> f32 {
        self.scale.unwrap_or(1.0)
    }

    /// Canvas rotation in degrees (neutral 0)
    pub fn rotation_deg(&self) -> f32 {
        self.rotation.unwrap_or(0.0)
    }

    /// Hue rotation in degrees (neutral 0)
    pub fn hue_shift_deg(&self) -> f32 {
        self.hue_shift.unwrap_or(0.0)
    }

    /// Brightness multiplier (neutral 1.0)
    pub fn brightness(&self) -> f32 {
        self.brightness.unwrap_or(1.0)
    }

    /// Saturation multiplier (neutral 1.0)
    pub fn saturation(&self) -> f32 {
        self.saturation.unwrap_or(1.0)
    }

    /// Contrast multiplier (neutral 1.0)
    pub fn contrast(&self) -> f32 {
        self.contrast.unwrap_or(1.0)
    }

    /// Horizontal offset in pixels (neutral 0)
    pub fn x_offset(&self) -> f32 {
        self.x_offset.unwrap_or(0.0)
    }

    /// Vertical offset in pixels (neutral 0)
    pub fn y_offset(&self) -> f32 {
        self.y_offset.unwrap_or(0.0)
    }

    /// Squiggle displacement in pixels (neutral 0)
    pub fn squiggle(&self) -> f32 {
        self.squiggle.unwrap_or(0.0)
    }

    /// Stroke width multiplier (neutral 1.0)
    pub fn line_width(&self) -> f32 {
        self.line_width.unwrap_or(1.0)
    }

    /// Stroke glow blur radius (absent means [`GLOW_BASELINE`], not 0)
    pub fn glow(&self) -> f32 {
        self.glow.unwrap_or(GLOW_BASELINE)
    }

    /// Text scale multiplier (neutral 1.0)
    pub fn text_scale(&self) -> f32 {
        self.text_scale.unwrap_or(1.0)
    }

    /// Additive text rotation in degrees (neutral 0)
    pub fn text_rotation_deg(&self) -> f32 {
        self.text_rotation.unwrap_or(0.0)
    }

    /// Text glow blur radius (absent means [`GLOW_BASELINE`], not 0)
    pub fn text_glow(&self) -> f32 {
        self.text_glow.unwrap_or(GLOW_BASELINE)
    }
}
