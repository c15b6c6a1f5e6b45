//! Mirroring collaborator boundary.
//!
//! The compositor produces a finished 1920x1080 frame each tick; a
//! [`MirrorSink`] is whatever consumes it. Activation asks the sink whether
//! a native target picker exists; when it does not, the app surfaces
//! [`MANUAL_MIRROR_HINT`] and mirroring stays inactive.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tiny_skia::Pixmap;
use tracing::debug;

/// Shown when no native mirroring picker is available.
pub const MANUAL_MIRROR_HINT: &str =
    "Screen mirroring picker unavailable. Open your system's display settings and mirror the SonicCanvas output manually.";

/// Consumes composited mirror frames.
pub trait MirrorSink {
    /// Whether this sink can present a native target picker
    fn picker_available(&self) -> bool;

    /// Deliver one composited frame
    fn present(&mut self, frame: &Pixmap) -> Result<()>;
}

/// Writes mirror frames as a numbered PNG sequence.
pub struct PngSequenceSink {
    dir: PathBuf,
    frame_index: u32,
}

impl PngSequenceSink {
    /// Create the output directory and a sink writing into it
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create mirror output dir {:?}", dir))?;
        Ok(Self {
            dir,
            frame_index: 0,
        })
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u32 {
        self.frame_index
    }
}

impl MirrorSink for PngSequenceSink {
    fn picker_available(&self) -> bool {
        true
    }

    fn present(&mut self, frame: &Pixmap) -> Result<()> {
        let mut rgba = Vec::with_capacity((frame.width() * frame.height() * 4) as usize);
        for pixel in frame.pixels() {
            let straight = pixel.demultiply();
            rgba.extend_from_slice(&[
                straight.red(),
                straight.green(),
                straight.blue(),
                straight.alpha(),
            ]);
        }

        let path = self.dir.join(format!("frame_{:05}.png", self.frame_index));
        image::save_buffer(
            &path,
            &rgba,
            frame.width(),
            frame.height(),
            image::ColorType::Rgba8,
        )
        .with_context(|| format!("Failed to write mirror frame {:?}", path))?;
        self.frame_index += 1;
        debug!("Wrote mirror frame {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_sink_writes_sequence() {
        let dir = std::env::temp_dir().join(format!("sonic-mirror-test-{}", std::process::id()));
        let mut sink = PngSequenceSink::new(dir.clone()).unwrap();

        let frame = Pixmap::new(32, 18).unwrap();
        sink.present(&frame).unwrap();
        sink.present(&frame).unwrap();

        assert_eq!(sink.frames_written(), 2);
        assert!(dir.join("frame_00000.png").exists());
        assert!(dir.join("frame_00001.png").exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
