use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// An sRGB color, 8 bits per channel.  Front ends translate this into
/// whatever color type their renderer expects.
pub type Rgb = [u8; 3];

const DEFAULT_COLOR: Rgb = [128, 128, 128];

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            [
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: toxin family → color
// ---------------------------------------------------------------------------

/// Maps toxin families to distinct colours, stable across redraws of the
/// same result.
#[derive(Debug, Clone)]
pub struct FamilyColors {
    mapping: BTreeMap<String, Rgb>,
}

impl FamilyColors {
    /// Assign colours to families in the order given.
    pub fn new<'a>(families: impl IntoIterator<Item = &'a str>) -> Self {
        let families: Vec<&str> = families.into_iter().collect();
        let palette = generate_palette(families.len());
        let mapping = families
            .into_iter()
            .map(str::to_string)
            .zip(palette)
            .collect();
        FamilyColors { mapping }
    }

    /// Look up the colour for a family.
    pub fn color_for(&self, family: &str) -> Rgb {
        self.mapping.get(family).copied().unwrap_or(DEFAULT_COLOR)
    }

    /// Legend entries (family → colour) for the chart.
    pub fn legend_entries(&self) -> Vec<(String, Rgb)> {
        self.mapping
            .iter()
            .map(|(f, c)| (f.clone(), *c))
            .collect()
    }
}
