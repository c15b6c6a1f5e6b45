//! Seed artwork for headless runs.
//!
//! The binary renders nothing interesting over an empty model, so demo runs
//! start from a small scene: two strokes and a committed title text.

use glam::Vec2;
use sonic_core::{ArtworkModel, Color, FontId, Stroke};

/// Populate `artwork` with the demo scene.
pub fn seed(artwork: &mut ArtworkModel) {
    // A sine sweep across the upper canvas
    artwork.append_stroke(Stroke {
        points: (0..=60)
            .map(|i| {
                let t = i as f32 / 60.0;
                Vec2::new(90.0 + t * 900.0, 520.0 + (t * std::f32::consts::TAU * 2.0).sin() * 140.0)
            })
            .collect(),
        color: Color::rgb(0xa8, 0x55, 0xf7),
        width: 9.0,
    });

    // A loose spiral in the lower half
    let center = Vec2::new(540.0, 1340.0);
    artwork.append_stroke(Stroke {
        points: (0..=120)
            .map(|i| {
                let angle = i as f32 * 0.16;
                let radius = 20.0 + i as f32 * 2.4;
                center + Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect(),
        color: Color::rgb(0x06, 0xb6, 0xd4),
        width: 6.0,
    });

    let id = artwork.add_text(Vec2::new(300.0, 260.0), Color::rgb(0xec, 0x48, 0x99), FontId::Strong);
    if let Some(text) = artwork.text_mut(id) {
        text.text = "SONIC".to_string();
        text.scale = 1.4;
        text.rotation_deg = -6.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_model() {
        let mut artwork = ArtworkModel::new();
        seed(&mut artwork);
        assert_eq!(artwork.strokes().len(), 2);
        assert_eq!(artwork.texts().len(), 1);
        assert!(artwork.strokes().iter().all(|s| s.points.len() >= 2));
        assert_eq!(artwork.texts()[0].text, "SONIC");
    }
}
