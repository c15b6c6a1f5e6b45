//! Application state and the reactive frame loop.
//!
//! Outside reactive mode the persistent surface is the artwork's visual
//! materialization: every edit triggers a neutral re-render. Reactive mode
//! adds an ephemeral surface redrawn from live audio every tick; exiting
//! tears the session down synchronously and restores the persistent view, so
//! no reactive write can race the restore.

use crate::mirror::{MirrorSink, MANUAL_MIRROR_HINT};
use anyhow::Result;
use glam::Vec2;
use sonic_core::{
    ArtworkModel, AudioConfig, CanvasConfig, ChannelBank, FeatureExtractor, InteractionController,
    Mode, SpectrumSource,
};
use sonic_render::{caret_visible, CanvasSurface, ComposingText, FrameInput, Letterbox, SceneRenderer};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reactive-mode state: the capture source and the surface it draws to.
/// Dropping it is the teardown — the capture session stops its stream.
struct ReactiveSession {
    source: Box<dyn SpectrumSource>,
    surface: CanvasSurface,
}

/// Active mirroring state.
struct Mirror {
    letterbox: Letterbox,
    sink: Box<dyn MirrorSink>,
}

/// The application: model, interaction, pipeline and surfaces.
pub struct App {
    canvas: CanvasConfig,
    audio: AudioConfig,
    artwork: ArtworkModel,
    interaction: InteractionController,
    channels: ChannelBank,
    extractor: FeatureExtractor,
    renderer: SceneRenderer,
    persistent: CanvasSurface,
    reactive: Option<ReactiveSession>,
    mirror: Option<Mirror>,
    started: Instant,
}

impl App {
    /// Create an app with an empty artwork
    pub fn new(canvas: CanvasConfig, audio: AudioConfig) -> Result<Self> {
        let persistent = CanvasSurface::new(&canvas)?;
        let mut app = Self {
            canvas,
            audio,
            artwork: ArtworkModel::new(),
            interaction: InteractionController::new(),
            channels: ChannelBank::default(),
            extractor: FeatureExtractor::new(),
            renderer: SceneRenderer::new(canvas),
            persistent,
            reactive: None,
            mirror: None,
            started: Instant::now(),
        };
        app.redraw_persistent();
        Ok(app)
    }

    /// The artwork model
    pub fn artwork(&self) -> &ArtworkModel {
        &self.artwork
    }

    /// The effect channel table
    pub fn channels(&self) -> &ChannelBank {
        &self.channels
    }

    /// Mutable channel table (settings edits)
    pub fn channels_mut(&mut self) -> &mut ChannelBank {
        &mut self.channels
    }

    /// The interaction state machine
    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    /// Whether reactive mode is active
    pub fn is_reactive(&self) -> bool {
        self.reactive.is_some()
    }

    /// The audio configuration
    pub fn audio_config(&self) -> &AudioConfig {
        &self.audio
    }

    // --- Input routing (canvas-space coordinates) ---

    /// Switch tool mode
    pub fn set_mode(&mut self, mode: Mode) {
        self.interaction.set_mode(mode, &mut self.artwork);
        self.redraw_persistent();
    }

    /// Pointer pressed
    pub fn pointer_down(&mut self, point: Vec2) {
        self.interaction
            .pointer_down(point, &mut self.artwork, self.renderer.measurer());
        self.redraw_persistent();
    }

    /// Pointer moved
    pub fn pointer_move(&mut self, point: Vec2) {
        self.interaction.pointer_move(point, &mut self.artwork);
        self.redraw_persistent();
    }

    /// Pointer released
    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up(&mut self.artwork);
        self.redraw_persistent();
    }

    /// Two-finger gesture began
    pub fn pinch_begin(&mut self, distance: f32, angle_deg: f32) {
        self.interaction.pinch_begin(distance, angle_deg, &self.artwork);
    }

    /// Two-finger gesture update
    pub fn pinch_update(&mut self, distance: f32, angle_deg: f32) {
        self.interaction.pinch_update(distance, angle_deg, &mut self.artwork);
        self.redraw_persistent();
    }

    /// Character typed into the composition buffer
    pub fn push_char(&mut self, c: char) {
        self.interaction.push_char(c);
        self.redraw_persistent();
    }

    /// Remove the last character of the composition buffer
    pub fn backspace(&mut self) {
        self.interaction.backspace();
        self.redraw_persistent();
    }

    /// Commit or discard the active composition
    pub fn finish_composition(&mut self) {
        self.interaction.finish_composition(&mut self.artwork);
        self.redraw_persistent();
    }

    /// Abandon the active composition
    pub fn cancel_composition(&mut self) {
        self.interaction.cancel_composition(&mut self.artwork);
        self.redraw_persistent();
    }

    /// Pick a color (applies to the brush and any active text)
    pub fn set_color(&mut self, color: sonic_core::Color) {
        self.interaction.set_color(color, &mut self.artwork);
        self.redraw_persistent();
    }

    /// Pick a font (applies to new and any active text)
    pub fn set_font(&mut self, font: sonic_core::FontId) {
        self.interaction.set_font(font, &mut self.artwork);
        self.redraw_persistent();
    }

    /// Set the brush width for new strokes
    pub fn set_brush_width(&mut self, width: f32) {
        self.interaction.set_brush_width(width);
    }

    /// Delete the selected text object
    pub fn delete_selected(&mut self) {
        self.interaction.delete_selected(&mut self.artwork);
        self.redraw_persistent();
    }

    /// Clear all strokes and texts
    pub fn clear_canvas(&mut self) {
        self.artwork.clear();
        self.redraw_persistent();
    }

    // --- Reactive mode lifecycle ---

    /// Enter reactive mode.
    ///
    /// Any previous session is fully torn down before `make_source` runs, so
    /// two live microphone handles can never coexist.
    pub fn enter_reactive(
        &mut self,
        make_source: impl FnOnce() -> Result<Box<dyn SpectrumSource>>,
    ) -> Result<()> {
        self.exit_reactive();
        let source = make_source()?;
        let surface = CanvasSurface::new(&self.canvas)?;
        self.extractor.reset();
        self.reactive = Some(ReactiveSession { source, surface });
        info!("Entered reactive mode");
        Ok(())
    }

    /// Exit reactive mode: drop the session (stopping capture) and restore
    /// the persistent surface. Runs synchronously; safe to call when not
    /// reactive.
    pub fn exit_reactive(&mut self) {
        if let Some(session) = self.reactive.take() {
            drop(session);
            info!("Exited reactive mode");
        }
        self.redraw_persistent();
    }

    /// Activate mirroring through `sink`. Returns false (leaving mirroring
    /// inactive) when the sink has no native target picker; the manual
    /// instructions are logged for the UI layer to surface.
    pub fn activate_mirror(&mut self, sink: Box<dyn MirrorSink>) -> Result<bool> {
        if !sink.picker_available() {
            info!("{}", MANUAL_MIRROR_HINT);
            return Ok(false);
        }
        self.mirror = Some(Mirror {
            letterbox: Letterbox::new()?,
            sink,
        });
        info!("Mirroring active");
        Ok(true)
    }

    /// Deactivate mirroring
    pub fn deactivate_mirror(&mut self) {
        self.mirror = None;
    }

    /// One animation tick: Extract -> Map -> Render -> Composite.
    ///
    /// Without an active session only the mirror (sourcing the persistent
    /// surface) runs.
    pub fn tick(&mut self) {
        if let Some(session) = self.reactive.as_mut() {
            let frame = session.source.pull();
            let features = self.extractor.process(frame.as_ref());
            let params = self.channels.evaluate(&features);
            self.renderer.render(
                &mut session.surface,
                &self.artwork,
                &FrameInput {
                    effects: Some(&params),
                    waveform: Some(&features.waveform),
                    composing: None,
                },
            );
        }

        if let Some(mirror) = self.mirror.as_mut() {
            let source = self
                .reactive
                .as_ref()
                .map(|session| &session.surface)
                .unwrap_or(&self.persistent);
            mirror.letterbox.composite(source);
            if let Err(e) = mirror.sink.present(mirror.letterbox.target()) {
                warn!("Mirror present failed: {}", e);
            }
        }
    }

    /// The surface a display would show right now
    pub fn active_surface(&self) -> &CanvasSurface {
        self.reactive
            .as_ref()
            .map(|session| &session.surface)
            .unwrap_or(&self.persistent)
    }

    /// Re-render the persistent surface neutrally, including the in-progress
    /// composition and its caret.
    fn redraw_persistent(&mut self) {
        let composing = self
            .interaction
            .composing()
            .map(|(id, buffer)| ComposingText {
                id,
                buffer,
                caret_on: caret_visible(self.started.elapsed()),
            });
        self.renderer.render(
            &mut self.persistent,
            &self.artwork,
            &FrameInput {
                effects: None,
                waveform: None,
                composing,
            },
        );
        debug!("Persistent surface redrawn");
    }

    /// Mutable artwork access for seeding (demo content); re-renders after.
    pub fn with_artwork(&mut self, edit: impl FnOnce(&mut ArtworkModel)) {
        edit(&mut self.artwork);
        self.redraw_persistent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_core::{AudioFrame, MockSource};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    fn test_app() -> App {
        let canvas = CanvasConfig {
            width: 64,
            height: 96,
            ..Default::default()
        };
        App::new(canvas, AudioConfig::default()).unwrap()
    }

    /// Source double that flags its own teardown.
    struct TrackedSource {
        dropped: Arc<AtomicBool>,
    }

    impl SpectrumSource for TrackedSource {
        fn pull(&mut self) -> Option<AudioFrame> {
            None
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    struct CountingSink {
        presented: Arc<AtomicU32>,
        picker: bool,
    }

    impl MirrorSink for CountingSink {
        fn picker_available(&self) -> bool {
            self.picker
        }

        fn present(&mut self, _frame: &tiny_skia::Pixmap) -> Result<()> {
            self.presented.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_sessions_never_overlap() {
        let mut app = test_app();
        let first_dropped = Arc::new(AtomicBool::new(false));

        let flag = first_dropped.clone();
        app.enter_reactive(move || Ok(Box::new(TrackedSource { dropped: flag }) as _))
            .unwrap();
        assert!(app.is_reactive());

        // The first session must be gone before the second source exists
        let observed = first_dropped.clone();
        app.enter_reactive(move || {
            assert!(
                observed.load(Ordering::SeqCst),
                "previous session must be torn down before a new one starts"
            );
            Ok(Box::new(MockSource::new(512)) as _)
        })
        .unwrap();
        assert!(app.is_reactive());
    }

    #[test]
    fn test_exit_reactive_tears_down_and_restores() {
        let mut app = test_app();
        app.with_artwork(|artwork| {
            artwork.append_stroke(sonic_core::Stroke {
                points: vec![Vec2::new(5.0, 5.0), Vec2::new(40.0, 60.0)],
                color: sonic_core::Color::WHITE,
                width: 3.0,
            });
        });
        let persistent_before = app.persistent.pixmap().data().to_vec();

        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();
        app.enter_reactive(move || Ok(Box::new(TrackedSource { dropped: flag }) as _))
            .unwrap();
        app.tick();

        app.exit_reactive();
        assert!(dropped.load(Ordering::SeqCst));
        assert!(!app.is_reactive());
        assert_eq!(app.persistent.pixmap().data(), &persistent_before[..]);
    }

    #[test]
    fn test_exit_reactive_is_idempotent() {
        let mut app = test_app();
        app.exit_reactive();
        app.exit_reactive();
        assert!(!app.is_reactive());
    }

    #[test]
    fn test_tick_drives_mirror_from_active_surface() {
        let mut app = test_app();
        let presented = Arc::new(AtomicU32::new(0));
        let active = app
            .activate_mirror(Box::new(CountingSink {
                presented: presented.clone(),
                picker: true,
            }))
            .unwrap();
        assert!(active);

        // Not reactive: the mirror still runs, sourcing the persistent surface
        app.tick();
        assert_eq!(presented.load(Ordering::SeqCst), 1);

        app.enter_reactive(|| Ok(Box::new(MockSource::new(512)) as _))
            .unwrap();
        app.tick();
        assert_eq!(presented.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mirror_without_picker_stays_inactive() {
        let mut app = test_app();
        let presented = Arc::new(AtomicU32::new(0));
        let active = app
            .activate_mirror(Box::new(CountingSink {
                presented: presented.clone(),
                picker: false,
            }))
            .unwrap();
        assert!(!active);

        app.tick();
        assert_eq!(presented.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reactive_tick_draws_from_live_audio() {
        let mut app = test_app();
        app.with_artwork(|artwork| {
            artwork.append_stroke(sonic_core::Stroke {
                points: vec![Vec2::new(5.0, 48.0), Vec2::new(60.0, 48.0)],
                color: sonic_core::Color::rgb(255, 0, 0),
                width: 3.0,
            });
        });

        app.enter_reactive(|| Ok(Box::new(MockSource::new(512)) as _))
            .unwrap();
        app.tick();
        let first = app.active_surface().pixmap().data().to_vec();

        // The mock sweep changes features between ticks, so frames differ
        for _ in 0..5 {
            app.tick();
        }
        let later = app.active_surface().pixmap().data().to_vec();
        assert_ne!(first, later);
    }

    #[test]
    fn test_text_composition_through_app() {
        let mut app = test_app();
        app.set_mode(Mode::Text);
        app.pointer_down(Vec2::new(30.0, 40.0));
        app.push_char('h');
        app.push_char('i');
        app.backspace();
        app.push_char('i');
        app.finish_composition();

        assert_eq!(app.artwork().texts().len(), 1);
        assert_eq!(app.artwork().texts()[0].text, "hi");

        app.delete_selected();
        assert!(app.artwork().texts().is_empty());
    }

    #[test]
    fn test_clear_canvas_is_atomic() {
        let mut app = test_app();
        app.with_artwork(|artwork| {
            artwork.append_stroke(sonic_core::Stroke {
                points: vec![Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)],
                color: sonic_core::Color::WHITE,
                width: 1.0,
            });
            let id = artwork.add_text(Vec2::new(10.0, 10.0), sonic_core::Color::WHITE, sonic_core::FontId::Classic);
            artwork.text_mut(id).unwrap().text = "x".to_string();
        });

        app.clear_canvas();
        assert_eq!(app.artwork().strokes().len(), 0);
        assert_eq!(app.artwork().texts().len(), 0);
    }
}
