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
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// District → Color32
// ---------------------------------------------------------------------------

/// Stable colour per district, so a district keeps its colour across
/// charts and filter changes.
#[derive(Debug, Clone)]
pub struct DistrictColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl Default for DistrictColors {
    fn default() -> Self {
        DistrictColors {
            mapping: BTreeMap::new(),
            default_color: Color32::LIGHT_BLUE,
        }
    }
}

impl DistrictColors {
    /// Build the mapping from the dataset's sorted districts.
    pub fn new<'a>(districts: impl IntoIterator<Item = &'a str>) -> Self {
        let districts: Vec<&str> = districts.into_iter().collect();
        let palette = generate_palette(districts.len());
        let mapping = districts
            .into_iter()
            .zip(palette)
            .map(|(d, c)| (d.to_owned(), c))
            .collect();

        DistrictColors {
            mapping,
            ..DistrictColors::default()
        }
    }

    pub fn color_for(&self, district: &str) -> Color32 {
        self.mapping
            .get(district)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(7).len(), 7);
    }

    #[test]
    fn unknown_district_falls_back() {
        let colors = DistrictColors::new(["Lapa", "Moema"]);
        assert_ne!(colors.color_for("Lapa"), colors.color_for("Moema"));
        assert_eq!(colors.color_for("Sé"), Color32::LIGHT_BLUE);
    }
}
