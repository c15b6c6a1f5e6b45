//! FFT-based spectrum analysis over a ring-buffered sample stream.
//!
//! The analyzer accumulates raw capture samples and, on demand, produces one
//! [`AudioFrame`]: a Hann-windowed forward FFT reduced to a normalized,
//! exponentially smoothed magnitude spectrum, plus the centered time-domain
//! window the spectrum was computed from. Frames are computed at pull time so
//! a missed animation tick simply means the next pull sees fresher samples —
//! nothing is queued.

use crate::audio::features::AudioFrame;
use crate::config::AudioConfig;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::trace;

/// Spectrum analyzer with proper sample buffering.
pub struct SpectrumAnalyzer {
    /// FFT instance
    fft: Arc<dyn Fft<f32>>,

    /// Configuration
    config: AudioConfig,

    /// Input sample ring buffer (length `fft_size`)
    input_buffer: Vec<f32>,

    /// Write position in the ring buffer
    write_pos: usize,

    /// Total samples ever pushed; frames are unavailable until one full
    /// window has been filled
    total_samples: u64,

    /// FFT work buffer
    fft_buffer: Vec<Complex<f32>>,

    /// FFT scratch buffer
    scratch_buffer: Vec<Complex<f32>>,

    /// Precomputed Hann window
    window: Vec<f32>,

    /// Smoothed magnitude spectrum (half of the FFT size)
    smoothed_magnitudes: Vec<f32>,

    /// Pulls performed (for trace logging)
    frame_count: u64,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for the given configuration
    pub fn new(config: AudioConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        Self {
            fft,
            config,
            input_buffer: vec![0.0; fft_size],
            write_pos: 0,
            total_samples: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window,
            smoothed_magnitudes: vec![0.0; fft_size / 2],
            frame_count: 0,
        }
    }

    /// Push captured samples into the ring buffer.
    ///
    /// Non-finite samples are replaced by silence so they cannot contaminate
    /// the spectrum.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &sample in samples {
            let sample = if sample.is_finite() { sample } else { 0.0 };
            self.input_buffer[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.config.fft_size;
        }
        self.total_samples += samples.len() as u64;
    }

    /// Compute the current frame, or `None` until one full FFT window of
    /// samples has arrived.
    pub fn frame(&mut self) -> Option<AudioFrame> {
        if self.total_samples < self.config.fft_size as u64 {
            return None;
        }
        self.frame_count += 1;

        let fft_size = self.config.fft_size;

        // Unwrap the ring buffer: the write position is where the next sample
        // lands, so the oldest sample lives there
        let mut samples = Vec::with_capacity(fft_size);
        for i in 0..fft_size {
            let src_idx = (self.write_pos + i) % fft_size;
            let sample = self.input_buffer[src_idx];
            samples.push(sample);
            self.fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        // Positive frequencies only, normalized into [0, 1] and smoothed
        let norm_factor = 1.0 / (fft_size as f32).sqrt();
        let smoothing = self.config.smoothing;
        for (i, slot) in self.smoothed_magnitudes.iter_mut().enumerate() {
            let magnitude = (self.fft_buffer[i].norm() * norm_factor).clamp(0.0, 1.0);
            *slot = *slot * smoothing + magnitude * (1.0 - smoothing);
        }

        if self.frame_count % 600 == 0 {
            trace!(
                "Spectrum frame #{}: first bins {:?}",
                self.frame_count,
                &self.smoothed_magnitudes[..4.min(self.smoothed_magnitudes.len())]
            );
        }

        Some(AudioFrame {
            spectrum: self.smoothed_magnitudes.clone(),
            samples,
        })
    }

    /// Reset all buffered state
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.write_pos = 0;
        self.total_samples = 0;
        self.smoothed_magnitudes.fill(0.0);
        self.frame_count = 0;
    }

    /// Configured sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Configured FFT size
    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }
}
