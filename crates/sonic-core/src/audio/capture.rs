//! Microphone capture session lifecycle.
//!
//! A [`CaptureSession`] owns one cpal input stream feeding a shared
//! [`SpectrumAnalyzer`]. Sessions must never overlap — a stale session would
//! leak a live microphone handle — so callers tear down any previous session
//! before starting a new one. Teardown is idempotent: stopping an already
//! stopped session logs and does nothing.

use crate::audio::analyzer::SpectrumAnalyzer;
use crate::audio::features::AudioFrame;
use thiserror::Error;

#[cfg(feature = "audio")]
pub use cpal_session::CaptureSession;

/// Capture subsystem errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No input device is present on the host
    #[error("no audio input device available")]
    NoDevice,

    /// A device was requested by name but is not present
    #[error("audio input device '{0}' not found")]
    DeviceNotFound(String),

    /// The device exists but refused access (permission denial or the device
    /// disappearing between enumeration and open)
    #[error("microphone access denied or device unavailable: {0}")]
    AccessDenied(String),

    /// The input stream could not be built or started
    #[error("failed to open input stream: {0}")]
    Stream(String),
}

/// Pull interface over the capture subsystem.
///
/// One pull per animation tick; a missed tick means the next pull reads
/// fresher data, never a stale buffered frame. `None` means no analyzable
/// window exists yet.
pub trait SpectrumSource {
    /// Latest analyzed frame, if one full FFT window has been captured
    fn pull(&mut self) -> Option<AudioFrame>;
}

impl SpectrumSource for SpectrumAnalyzer {
    fn pull(&mut self) -> Option<AudioFrame> {
        self.frame()
    }
}

#[cfg(feature = "audio")]
mod cpal_session {
    use super::*;
    use crate::config::AudioConfig;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing::{debug, info, warn};

    /// An active microphone capture session.
    ///
    /// The cpal callback pushes samples (mixed down to mono) into the shared
    /// analyzer; [`SpectrumSource::pull`] computes the latest frame from it.
    pub struct CaptureSession {
        stream: Option<cpal::Stream>,
        analyzer: Arc<Mutex<SpectrumAnalyzer>>,
        device_name: String,
    }

    impl CaptureSession {
        /// List the names of all available input devices.
        pub fn list_devices() -> Result<Vec<String>, CaptureError> {
            let host = cpal::default_host();
            let devices = host
                .input_devices()
                .map_err(|e| CaptureError::AccessDenied(e.to_string()))?;
            Ok(devices
                .filter_map(|d| d.name().ok())
                .collect())
        }

        /// Open the named device (or the host default) and start capturing.
        ///
        /// On failure no session state exists and the call is safe to retry.
        pub fn start(config: &AudioConfig, device_name: Option<&str>) -> Result<Self, CaptureError> {
            let host = cpal::default_host();

            let device = match device_name {
                Some(name) => host
                    .input_devices()
                    .map_err(|e| CaptureError::AccessDenied(e.to_string()))?
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?,
                None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
            };
            let resolved_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());

            let supported = device
                .default_input_config()
                .map_err(|e| CaptureError::AccessDenied(e.to_string()))?;
            let sample_format = supported.sample_format();
            let stream_config: cpal::StreamConfig = supported.into();
            let channels = stream_config.channels as usize;

            // The analyzer runs at the device's native rate
            let analyzer = Arc::new(Mutex::new(SpectrumAnalyzer::new(AudioConfig {
                sample_rate: stream_config.sample_rate,
                ..*config
            })));

            let callback_analyzer = analyzer.clone();
            let err_fn = |e: cpal::StreamError| warn!("Capture stream error: {}", e);

            let stream = match sample_format {
                cpal::SampleFormat::F32 => device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            push_mono(&callback_analyzer, data, channels);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| CaptureError::Stream(e.to_string()))?,
                cpal::SampleFormat::I16 => device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            let converted: Vec<f32> =
                                data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                            push_mono(&callback_analyzer, &converted, channels);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| CaptureError::Stream(e.to_string()))?,
                cpal::SampleFormat::U16 => device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[u16], _: &cpal::InputCallbackInfo| {
                            let converted: Vec<f32> = data
                                .iter()
                                .map(|&s| (s as f32 - 32768.0) / 32768.0)
                                .collect();
                            push_mono(&callback_analyzer, &converted, channels);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| CaptureError::Stream(e.to_string()))?,
                other => {
                    return Err(CaptureError::Stream(format!(
                        "unsupported sample format {other:?}"
                    )))
                }
            };

            stream
                .play()
                .map_err(|e| CaptureError::Stream(e.to_string()))?;

            info!(
                "Capture session started on '{}' ({} Hz, {} ch)",
                resolved_name, stream_config.sample_rate, channels
            );

            Ok(Self {
                stream: Some(stream),
                analyzer,
                device_name: resolved_name,
            })
        }

        /// Name of the device this session captures from
        pub fn device_name(&self) -> &str {
            &self.device_name
        }

        /// Stop the stream. Idempotent; teardown failures are logged and
        /// swallowed so exiting reactive mode can never block on them.
        pub fn stop(&mut self) {
            if let Some(stream) = self.stream.take() {
                if let Err(e) = stream.pause() {
                    warn!("Ignoring capture teardown failure: {}", e);
                }
                drop(stream);
                info!("Capture session on '{}' stopped", self.device_name);
            } else {
                debug!("Capture session already stopped");
            }
        }
    }

    impl SpectrumSource for CaptureSession {
        fn pull(&mut self) -> Option<AudioFrame> {
            self.analyzer.lock().frame()
        }
    }

    impl Drop for CaptureSession {
        fn drop(&mut self) {
            self.stop();
        }
    }

    /// Mix interleaved frames down to mono and feed the analyzer.
    fn push_mono(analyzer: &Arc<Mutex<SpectrumAnalyzer>>, data: &[f32], channels: usize) {
        if channels <= 1 {
            analyzer.lock().push_samples(data);
            return;
        }
        let mono: Vec<f32> = data
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        analyzer.lock().push_samples(&mono);
    }
}

/// Deterministic synthetic source for tests and headless demos.
///
/// Produces a slowly sweeping spectral peak over a noise floor, a low-band
/// kick every 60 pulls, and a sine waveform, so every feature and effect
/// channel gets exercised without a microphone.
#[cfg(any(test, feature = "mock-audio"))]
pub struct MockSource {
    tick: u64,
    spectrum_len: usize,
    window_len: usize,
}

#[cfg(any(test, feature = "mock-audio"))]
impl MockSource {
    /// Create a mock source producing frames shaped like a real analyzer's
    /// for the given FFT size.
    pub fn new(fft_size: usize) -> Self {
        Self {
            tick: 0,
            spectrum_len: fft_size / 2,
            window_len: fft_size,
        }
    }
}

#[cfg(any(test, feature = "mock-audio"))]
impl SpectrumSource for MockSource {
    fn pull(&mut self) -> Option<AudioFrame> {
        self.tick += 1;
        let t = self.tick as f32;

        let mut spectrum = vec![0.05; self.spectrum_len];
        let peak = (self.tick as usize * 3) % self.spectrum_len;
        spectrum[peak] = 0.8;

        // Kick: three loud low-band frames every 60 pulls
        if self.tick % 60 < 3 {
            let third = self.spectrum_len / 3;
            for bin in spectrum.iter_mut().take(third) {
                *bin = 0.9;
            }
        }

        let samples: Vec<f32> = (0..self.window_len)
            .map(|i| (i as f32 * 0.05 + t * 0.3).sin() * 0.4)
            .collect();

        Some(AudioFrame { spectrum, samples })
    }
}
