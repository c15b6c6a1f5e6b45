//! SonicCanvas - audio-reactive drawing canvas.
//!
//! Headless runtime: draws (or seeds) an artwork, enters reactive mode over
//! a microphone or a synthetic source, and runs the frame loop for a bounded
//! number of ticks, optionally mirroring letterboxed frames to a PNG
//! sequence. The interactive UI chrome is an external collaborator; this
//! binary exercises the full pipeline behind it.

use anyhow::{Context, Result};
use clap::Parser;
use sonic_canvas::app::App;
use sonic_canvas::demo;
use sonic_canvas::mirror::PngSequenceSink;
use sonic_core::{AudioConfig, CanvasConfig, MockSource, SpectrumSource};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "SonicCanvas", about = "Audio-reactive drawing canvas", version)]
struct Cli {
    /// List available audio input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Capture from this input device (default: system default)
    #[arg(long)]
    device: Option<String>,

    /// Use the deterministic synthetic audio source instead of a microphone
    #[arg(long)]
    mock: bool,

    /// Number of reactive frames to run
    #[arg(long, default_value_t = 300)]
    frames: u32,

    /// Target frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Mirror letterboxed frames into this directory as a PNG sequence
    #[arg(long)]
    mirror_dir: Option<PathBuf>,

    /// Start from an empty canvas instead of the demo artwork
    #[arg(long)]
    no_demo: bool,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    if cli.list_devices {
        let devices =
            sonic_core::CaptureSession::list_devices().context("Failed to list audio devices")?;
        if devices.is_empty() {
            println!("No audio input devices found");
        } else {
            for name in devices {
                println!("{name}");
            }
        }
        return Ok(());
    }

    let canvas = CanvasConfig::default();
    let audio = AudioConfig::default();
    let mut app = App::new(canvas, audio)?;

    if !cli.no_demo {
        app.with_artwork(demo::seed);
    }

    if let Some(dir) = cli.mirror_dir.clone() {
        let sink = PngSequenceSink::new(dir)?;
        app.activate_mirror(Box::new(sink))?;
    }

    let fft_size = app.audio_config().fft_size;
    let device = cli.device.clone();
    let use_mock = cli.mock;
    app.enter_reactive(move || -> Result<Box<dyn SpectrumSource>> {
        if use_mock {
            info!("Using synthetic audio source");
            Ok(Box::new(MockSource::new(fft_size)))
        } else {
            let session = sonic_core::CaptureSession::start(&audio, device.as_deref())
                .context("Microphone access denied or unavailable")?;
            info!("Capturing from '{}'", session.device_name());
            Ok(Box::new(session))
        }
    })?;

    let frame_target = Duration::from_secs_f64(1.0 / cli.fps.max(1.0) as f64);
    info!(
        "Running {} reactive frames at {:.0} fps target",
        cli.frames, cli.fps
    );

    for _ in 0..cli.frames {
        let frame_start = Instant::now();
        app.tick();

        // Frame limiter: sleep off the rest of the frame interval
        let spent = frame_start.elapsed();
        if spent < frame_target {
            std::thread::sleep(frame_target - spent);
        }
    }

    app.exit_reactive();
    info!("Done");
    Ok(())
}
