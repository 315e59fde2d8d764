use palette::{Hsl, IntoColor, Mix, Srgb};

/// An 8-bit sRGB triple, shared by the bitmap renderer and the GUI.
pub type Rgb = [u8; 3];

// ---------------------------------------------------------------------------
// Sequential gradient
// ---------------------------------------------------------------------------

/// Dark end of the heat gradient (deep indigo).
fn cold() -> Hsl {
    Hsl::new(255.0, 0.65, 0.12)
}

/// Bright end of the heat gradient (pale yellow).
fn hot() -> Hsl {
    Hsl::new(55.0, 0.95, 0.85)
}

/// Colour for `t` in `[0, 1]`; values outside are clamped.
pub fn heat(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let hsl = cold().mix(hot(), t as f32);
    let rgb: Srgb = hsl.into_color();
    [
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

// ---------------------------------------------------------------------------
// HeatScale: value → colour
// ---------------------------------------------------------------------------

/// Maps a numeric range onto the heat gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatScale {
    min: f64,
    max: f64,
}

impl HeatScale {
    pub fn new(min: f64, max: f64) -> Self {
        HeatScale { min, max }
    }

    /// Scale spanning the finite values of `values`; `[0, 1]` when there are none.
    pub fn spanning(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            HeatScale::new(0.0, 1.0)
        } else {
            HeatScale::new(min, max)
        }
    }

    /// Position of `value` within the range, in `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.min) / range).clamp(0.0, 1.0)
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        heat(self.normalize(value))
    }
}
