//! Audio capture and analysis.
//!
//! Capture is a pull-based collaborator: the frame loop asks for the latest
//! analyzed [`AudioFrame`](features::AudioFrame) each tick; nothing is queued
//! between ticks. See [`capture::SpectrumSource`].

pub mod analyzer;
pub mod capture;
pub mod features;
