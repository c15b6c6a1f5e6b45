//! Per-tick audio feature extraction.
//!
//! Every animation tick one [`AudioFrame`] is reduced to nine scalar
//! features plus a fixed-length waveform. Extraction is a pure function of
//! (frame, previous onset state); the onset accumulator for `bass_hit` is the
//! only value that crosses ticks and it is threaded explicitly through
//! [`extract`] rather than held as ambient state.

use serde::{Deserialize, Serialize};

/// Length of the downsampled waveform buffer
pub const WAVEFORM_LEN: usize = 128;

/// Onset threshold: the low band must exceed the smoothed low band by this
/// much before `bass_hit` fires
const BASS_HIT_THRESHOLD: f32 = 0.05;

/// Gain applied to the onset excess before saturating at 1.0
const BASS_HIT_GAIN: f32 = 4.0;

/// Weight of the incoming low-band value in the onset smoother (the
/// remainder retains the previous smoothed value)
const ONSET_ATTACK: f32 = 0.8;

/// One frame of analyzed audio, as pulled from the capture subsystem.
///
/// `spectrum` holds magnitude bins normalized to `[0, 1]`; `samples` holds a
/// time-domain window centered so silence sits at 0 (values ≈ `[-1, 1]`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFrame {
    /// Normalized magnitude spectrum
    pub spectrum: Vec<f32>,
    /// Centered time-domain window
    pub samples: Vec<f32>,
}

/// Names of the extractable features, used to bind effect channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    /// RMS of the magnitude spectrum
    Volume,
    /// Dominant-bin proxy (argmax index / bin count), not true pitch tracking
    Pitch,
    /// Mean magnitude of the low third of the spectrum
    LowFreq,
    /// Mean magnitude of the middle third
    MidFreq,
    /// Mean magnitude of the high third
    HighFreq,
    /// Magnitude-weighted mean bin index, normalized
    SpectralCentroid,
    /// Mean absolute difference between adjacent bins of the same frame.
    /// Intra-frame by (preserved) design, despite the conventional meaning.
    SpectralFlux,
    /// Zero crossings of the time window / sample count
    ZeroCrossing,
    /// Low-band onset detector output
    BassHit,
}

impl FeatureName {
    /// All features, in picker order
    pub const ALL: [FeatureName; 9] = [
        FeatureName::Volume,
        FeatureName::Pitch,
        FeatureName::LowFreq,
        FeatureName::MidFreq,
        FeatureName::HighFreq,
        FeatureName::BassHit,
        FeatureName::SpectralCentroid,
        FeatureName::SpectralFlux,
        FeatureName::ZeroCrossing,
    ];

    /// Display name for pickers
    pub fn label(&self) -> &'static str {
        match self {
            FeatureName::Volume => "Volume",
            FeatureName::Pitch => "Pitch",
            FeatureName::LowFreq => "Bass",
            FeatureName::MidFreq => "Mids",
            FeatureName::HighFreq => "Treble",
            FeatureName::SpectralCentroid => "Brightness",
            FeatureName::SpectralFlux => "Change",
            FeatureName::ZeroCrossing => "Noise",
            FeatureName::BassHit => "Bass Hit",
        }
    }
}

/// The per-tick feature snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFeatures {
    /// RMS of the magnitude spectrum
    pub volume: f32,
    /// Dominant-bin pitch proxy
    pub pitch: f32,
    /// Low-band mean
    pub low_freq: f32,
    /// Mid-band mean
    pub mid_freq: f32,
    /// High-band mean
    pub high_freq: f32,
    /// Normalized spectral centroid
    pub spectral_centroid: f32,
    /// Intra-frame spectral flux
    pub spectral_flux: f32,
    /// Normalized zero-crossing count
    pub zero_crossing: f32,
    /// Onset detector output
    pub bass_hit: f32,
    /// Downsampled time-domain waveform
    pub waveform: [f32; WAVEFORM_LEN],
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            volume: 0.0,
            pitch: 0.0,
            low_freq: 0.0,
            mid_freq: 0.0,
            high_freq: 0.0,
            spectral_centroid: 0.0,
            spectral_flux: 0.0,
            zero_crossing: 0.0,
            bass_hit: 0.0,
            waveform: [0.0; WAVEFORM_LEN],
        }
    }
}

impl AudioFeatures {
    /// Look up a feature by name
    pub fn get(&self, name: FeatureName) -> f32 {
        match name {
            FeatureName::Volume => self.volume,
            FeatureName::Pitch => self.pitch,
            FeatureName::LowFreq => self.low_freq,
            FeatureName::MidFreq => self.mid_freq,
            FeatureName::HighFreq => self.high_freq,
            FeatureName::SpectralCentroid => self.spectral_centroid,
            FeatureName::SpectralFlux => self.spectral_flux,
            FeatureName::ZeroCrossing => self.zero_crossing,
            FeatureName::BassHit => self.bass_hit,
        }
    }
}

/// Cross-tick state of the bass onset detector: the smoothed low-band value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnsetState {
    /// Exponentially smoothed low-band magnitude
    pub smoothed_low: f32,
}

/// Extract a feature snapshot from one frame.
///
/// Pure: the returned [`OnsetState`] must be passed back on the next tick.
pub fn extract(frame: &AudioFrame, onset: OnsetState) -> (AudioFeatures, OnsetState) {
    let spectrum = &frame.spectrum;
    let samples = &frame.samples;

    let mut features = AudioFeatures::default();
    if spectrum.is_empty() {
        return (features, onset);
    }

    // volume: RMS over all bins
    let sq_sum: f32 = spectrum.iter().map(|m| m * m).sum();
    features.volume = (sq_sum / spectrum.len() as f32).sqrt();

    // Equal thirds; trailing bins past 3*third belong to no band
    let third = spectrum.len() / 3;
    if third > 0 {
        let mean = |bins: &[f32]| bins.iter().sum::<f32>() / third as f32;
        features.low_freq = mean(&spectrum[..third]);
        features.mid_freq = mean(&spectrum[third..2 * third]);
        features.high_freq = mean(&spectrum[2 * third..3 * third]);
    }

    // bass_hit: onset, not level. Fires only when the instantaneous low band
    // exceeds the previous smoothed value by more than the threshold.
    let excess = features.low_freq - onset.smoothed_low;
    if excess > BASS_HIT_THRESHOLD {
        features.bass_hit = (excess * BASS_HIT_GAIN).min(1.0);
    }
    let next_onset = OnsetState {
        smoothed_low: features.low_freq * ONSET_ATTACK + onset.smoothed_low * (1.0 - ONSET_ATTACK),
    };

    // pitch proxy: dominant bin index
    let mut max_index = 0;
    let mut max_value = 0.0f32;
    for (i, &m) in spectrum.iter().enumerate() {
        if m > max_value {
            max_value = m;
            max_index = i;
        }
    }
    features.pitch = max_index as f32 / spectrum.len() as f32;

    // spectral centroid, 0 when the frame carries no energy
    let mut weighted_sum = 0.0f32;
    let mut sum = 0.0f32;
    for (i, &m) in spectrum.iter().enumerate() {
        weighted_sum += i as f32 * m;
        sum += m;
    }
    if sum > 0.0 {
        features.spectral_centroid = (weighted_sum / sum) / spectrum.len() as f32;
    }

    // "spectral flux": adjacent-bin difference within this frame, first bin
    // differenced against 0
    let mut flux = 0.0f32;
    let mut prev = 0.0f32;
    for &m in spectrum {
        flux += (m - prev).abs();
        prev = m;
    }
    features.spectral_flux = flux / spectrum.len() as f32;

    if !samples.is_empty() {
        // zero crossings over the centered window
        let mut crossings = 0u32;
        for pair in samples.windows(2) {
            if (pair[1] >= 0.0) != (pair[0] >= 0.0) {
                crossings += 1;
            }
        }
        features.zero_crossing = crossings as f32 / samples.len() as f32;

        // nearest-index downsample, no interpolation
        for (i, slot) in features.waveform.iter_mut().enumerate() {
            let idx = (i as f32 / WAVEFORM_LEN as f32 * samples.len() as f32) as usize;
            *slot = samples[idx.min(samples.len() - 1)];
        }
    }

    (features, next_onset)
}

/// Stateful wrapper around [`extract`] owning the onset accumulator.
#[derive(Debug, Default)]
pub struct FeatureExtractor {
    onset: OnsetState,
}

impl FeatureExtractor {
    /// Create an extractor with a zeroed onset accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract features for this tick. With no active frame (no audio
    /// session) a neutral snapshot is returned and no state changes.
    pub fn process(&mut self, frame: Option<&AudioFrame>) -> AudioFeatures {
        match frame {
            Some(frame) => {
                let (features, onset) = extract(frame, self.onset);
                self.onset = onset;
                features
            }
            None => AudioFeatures::default(),
        }
    }

    /// Reset the onset accumulator
    pub fn reset(&mut self) {
        self.onset = OnsetState::default();
    }
}
