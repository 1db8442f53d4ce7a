use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

use crate::data::filter::HIGH_CONFIDENCE;
use crate::data::model::TransmissionMode;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Detection scales
// ---------------------------------------------------------------------------

/// Deep teal for sparse schools through to gold for dense ones.
pub fn density_color(density: f64) -> Color32 {
    let t = if density.is_nan() {
        0.0
    } else {
        density.clamp(0.0, 1.0) as f32
    };
    let sparse = Hsl::new(190.0, 0.70, 0.45);
    let dense = Hsl::new(45.0, 0.95, 0.55);
    to_color32(sparse.mix(dense, t))
}

/// Green above the high-confidence cut, yellow above 0.6, orange below.
pub fn confidence_color(confidence: f64) -> Color32 {
    if confidence > HIGH_CONFIDENCE {
        Color32::from_rgb(74, 222, 128)
    } else if confidence > 0.6 {
        Color32::from_rgb(250, 204, 21)
    } else {
        Color32::from_rgb(251, 146, 60)
    }
}

// ---------------------------------------------------------------------------
// Transmission mode colours
// ---------------------------------------------------------------------------

/// Fixed colour per transmission mode for tables and plot markers.
#[derive(Debug, Clone)]
pub struct ModeColors {
    mapping: BTreeMap<TransmissionMode, Color32>,
    default_color: Color32,
}

impl Default for ModeColors {
    fn default() -> Self {
        let mapping = TransmissionMode::ALL
            .into_iter()
            .zip(generate_palette(TransmissionMode::ALL.len()))
            .collect();
        ModeColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }
}

impl ModeColors {
    pub fn color_for(&self, mode: TransmissionMode) -> Color32 {
        self.mapping
            .get(&mode)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(m, c)| (m.to_string(), *c))
            .collect()
    }
}
