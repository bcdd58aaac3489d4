//! Colormaps and value-to-color mapping.
//!
//! Palettes are discrete 64-entry RGB tables built once on first use. A value
//! is scaled into `[0, 1]` against a range, snapped to the nearest table entry
//! and paired with an alpha supplied by the zoom policy.

use std::sync::OnceLock;

use eframe::egui::Color32;

/// Number of entries in every built-in palette.
pub const PALETTE_SIZE: usize = 64;

/// RGB with straight (non-premultiplied) alpha, all channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], 1.0)
    }

    pub fn rgb(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// `#rrggbb` for SVG output.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.rgb().map(channel_to_u8);
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

#[inline]
pub fn channel_to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl From<Rgba> for Color32 {
    fn from(c: Rgba) -> Self {
        Color32::from_rgba_unmultiplied(
            channel_to_u8(c.r),
            channel_to_u8(c.g),
            channel_to_u8(c.b),
            channel_to_u8(c.a),
        )
    }
}

/// Convert HSV to RGB as floating point values (0.0-1.0).
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
#[inline]
pub fn hsv_to_rgb_f32(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

// =============================================================================
// Palettes
// =============================================================================

/// Built-in named colormaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Palette {
    /// Blue through green and yellow to red.
    Rainbow,
    /// Black to white with a blue cast.
    Bone,
    /// Magenta to yellow.
    #[default]
    Spring,
}

impl Palette {
    pub fn name(self) -> &'static str {
        match self {
            Self::Rainbow => "rainbow",
            Self::Bone => "bone",
            Self::Spring => "spring",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Rainbow, Self::Bone, Self::Spring]
    }

    /// Look a palette up by its (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// The palette after this one, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Rainbow => Self::Bone,
            Self::Bone => Self::Spring,
            Self::Spring => Self::Rainbow,
        }
    }

    /// The palette's RGB table, low values first.
    pub fn table(self) -> &'static [[f32; 3]] {
        static RAINBOW: OnceLock<Vec<[f32; 3]>> = OnceLock::new();
        static BONE: OnceLock<Vec<[f32; 3]>> = OnceLock::new();
        static SPRING: OnceLock<Vec<[f32; 3]>> = OnceLock::new();

        match self {
            Self::Rainbow => RAINBOW.get_or_init(|| build_table(rainbow)),
            Self::Bone => BONE.get_or_init(|| build_table(bone)),
            Self::Spring => SPRING.get_or_init(|| build_table(spring)),
        }
    }
}

fn build_table(f: fn(f32) -> [f32; 3]) -> Vec<[f32; 3]> {
    (0..PALETTE_SIZE)
        .map(|i| f(i as f32 / (PALETTE_SIZE - 1) as f32))
        .collect()
}

fn rainbow(t: f32) -> [f32; 3] {
    // Hue 240 (blue) at the low end down to 0 (red) at the high end.
    let (r, g, b) = hsv_to_rgb_f32((1.0 - t) * 240.0, 1.0, 1.0);
    [r, g, b]
}

fn hot(t: f32) -> [f32; 3] {
    [
        (t * 8.0 / 3.0).clamp(0.0, 1.0),
        (t * 8.0 / 3.0 - 1.0).clamp(0.0, 1.0),
        (t * 4.0 - 3.0).clamp(0.0, 1.0),
    ]
}

fn bone(t: f32) -> [f32; 3] {
    // Gray blended with a channel-reversed "hot" ramp.
    let [hr, hg, hb] = hot(t);
    [
        (7.0 * t + hb) / 8.0,
        (7.0 * t + hg) / 8.0,
        (7.0 * t + hr) / 8.0,
    ]
}

fn spring(t: f32) -> [f32; 3] {
    [1.0, t, 1.0 - t]
}

// =============================================================================
// Value Mapping
// =============================================================================

/// Value range used to scale data into the palette.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `(min, 1 / (max - min))`, substituting `min = max - 1` for an empty
    /// range so constant data maps to the top of the palette.
    pub fn scale(&self) -> (f64, f64) {
        let min = if self.max - self.min <= 0.0 {
            self.max - 1.0
        } else {
            self.min
        };
        (min, 1.0 / (self.max - min))
    }
}

/// A palette lookup prepared once per frame.
#[derive(Clone, Copy, Debug)]
pub struct ColorScale {
    table: &'static [[f32; 3]],
    min: f64,
    inv_range: f64,
    invert: bool,
    alpha: f32,
}

impl ColorScale {
    pub fn new(palette: Palette, range: ValueRange, invert: bool, alpha: f32) -> Self {
        let (min, inv_range) = range.scale();
        Self {
            table: palette.table(),
            min,
            inv_range,
            invert,
            alpha,
        }
    }

    /// Palette index for `value`.
    #[inline]
    pub fn index(&self, value: f64) -> usize {
        let last = self.table.len() - 1;
        let t = ((value - self.min) * self.inv_range).clamp(0.0, 1.0);
        // NaN casts to 0.
        let idx = (t * last as f64).round() as usize;
        if self.invert {
            last - idx
        } else {
            idx
        }
    }

    #[inline]
    pub fn color(&self, value: f64) -> Rgba {
        let [r, g, b] = self.table[self.index(value)];
        Rgba::new(r, g, b, self.alpha)
    }
}

/// Map one value to a color. Convenience form of [`ColorScale::color`].
pub fn map_color(value: f64, range: ValueRange, palette: Palette, invert: bool, alpha: f32) -> Rgba {
    ColorScale::new(palette, range, invert, alpha).color(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_to_rgb() {
        let (r, g, b) = hsv_to_rgb_f32(0.0, 1.0, 1.0);
        assert_eq!((r, g, b), (1.0, 0.0, 0.0));

        let (r, g, b) = hsv_to_rgb_f32(120.0, 1.0, 1.0);
        assert!(r < 0.01 && g > 0.99 && b < 0.01);

        let (r, g, b) = hsv_to_rgb_f32(240.0, 1.0, 1.0);
        assert!(r < 0.01 && g < 0.01 && b > 0.99);
    }

    #[test]
    fn test_palette_tables() {
        for &p in Palette::all() {
            let table = p.table();
            assert_eq!(table.len(), PALETTE_SIZE);
            assert!(table.iter().flatten().all(|c| (0.0..=1.0).contains(c)));
        }
        // Rainbow runs blue to red.
        let rainbow = Palette::Rainbow.table();
        assert!(rainbow[0][2] > rainbow[0][0]);
        assert!(rainbow[PALETTE_SIZE - 1][0] > rainbow[PALETTE_SIZE - 1][2]);
        assert_eq!(Palette::Spring.table()[0], [1.0, 0.0, 1.0]);
        assert_eq!(Palette::Bone.table()[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_palette_cycle_and_names() {
        let mut p = Palette::Rainbow;
        for _ in 0..3 {
            p = p.next();
        }
        assert_eq!(p, Palette::Rainbow);
        assert_eq!(Palette::default(), Palette::Spring);
        assert_eq!(Palette::from_name("BONE"), Some(Palette::Bone));
        assert_eq!(Palette::from_name("jet"), None);
    }

    #[test]
    fn test_boundary_indices() {
        let range = ValueRange::new(-2.0, 6.0);
        let scale = ColorScale::new(Palette::Rainbow, range, false, 1.0);
        assert_eq!(scale.index(-2.0), 0);
        assert_eq!(scale.index(6.0), PALETTE_SIZE - 1);

        let inverted = ColorScale::new(Palette::Rainbow, range, true, 1.0);
        assert_eq!(inverted.index(-2.0), PALETTE_SIZE - 1);
        assert_eq!(inverted.index(6.0), 0);
    }

    #[test]
    fn test_constant_range_maps_to_top() {
        let range = ValueRange::new(3.0, 3.0);
        assert_eq!(range.scale(), (2.0, 1.0));
        let scale = ColorScale::new(Palette::Bone, range, false, 1.0);
        assert_eq!(scale.index(3.0), PALETTE_SIZE - 1);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let scale = ColorScale::new(Palette::Spring, ValueRange::UNIT, false, 1.0);
        assert_eq!(scale.index(-0.5), 0);
        assert_eq!(scale.index(1.5), PALETTE_SIZE - 1);
        assert_eq!(scale.index(f64::NAN), 0);
    }

    #[test]
    fn test_map_color_carries_alpha() {
        let c = map_color(1.0, ValueRange::UNIT, Palette::Spring, false, 0.25);
        assert_eq!(c, Rgba::new(1.0, 1.0, 0.0, 0.25));
        assert_eq!(c.to_hex(), "#ffff00");
        assert_eq!(Color32::from(Rgba::opaque([1.0, 0.0, 0.0])), Color32::RED);
    }
}
