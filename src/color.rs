use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

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
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Heatmap colour for `t` in `[0, 1]`: pale yellow for low, deep red for high.
pub fn heat_color(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    hsl_to_color32(Hsl::new(55.0 - 55.0 * t, 0.85, 0.85 - 0.45 * t))
}

/// Colour for heatmap cells with no data. Distinct from any `heat_color`.
pub const MISSING_COLOR: Color32 = Color32::from_gray(90);

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the labels of a category (seasons, weathers) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<&'static str, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given labels.
    pub fn new(labels: &[&'static str]) -> Self {
        let palette = generate_palette(labels.len());
        let mapping = labels.iter().copied().zip(palette).collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_label_uses_default() {
        let map = ColorMap::new(&["Spring", "Summer"]);
        assert_ne!(map.color_for("Spring"), map.color_for("Summer"));
        assert_eq!(map.color_for("Monsoon"), Color32::GRAY);
    }

    #[test]
    fn heat_scale_never_matches_missing() {
        for i in 0..=10 {
            assert_ne!(heat_color(f64::from(i) / 10.0), MISSING_COLOR);
        }
        assert_ne!(heat_color(0.0), heat_color(1.0));
    }
}
