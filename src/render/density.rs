use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::data::model::{BreakSet, OutputGroup};
use crate::error::RenderError;

use super::{draw_or_discard, FONT_FAMILY};

/// Number of points the density curve is evaluated at.
const CURVE_POINTS: usize = 256;
/// The curve extends this many bandwidths past the data on both sides.
const CUT: f64 = 3.0;
/// Dashes per break marker.
const DASHES: usize = 24;

/// Pixel dimensions of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FigureSize {
    fn default() -> Self {
        FigureSize {
            width: 640,
            height: 480,
        }
    }
}

// ---------------------------------------------------------------------------
// Kernel density estimate
// ---------------------------------------------------------------------------

/// Scott's rule: `sigma * n^(-1/5)`, with the sample standard deviation.
/// Falls back to `1.0` when the spread is zero or there is a single value.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 1.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let h = var.sqrt() * (n as f64).powf(-0.2);
    if h > 0.0 && h.is_finite() {
        h
    } else {
        1.0
    }
}

/// Gaussian kernel density of `values` evaluated on an even grid over
/// `[lo, hi]`.
pub fn density_curve(values: &[f64], bandwidth: f64, lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    let step = (hi - lo) / (CURVE_POINTS - 1) as f64;
    (0..CURVE_POINTS)
        .map(|i| {
            let x = lo + step * i as f64;
            let y: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, y * norm)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

/// Draw the density of `sorted` with a dashed red line at every break and
/// save it as `figs/<name>.png`. Returns the path written.
pub fn render_density(
    group: &OutputGroup,
    name: &str,
    sorted: &[f64],
    breaks: &BreakSet,
    size: FigureSize,
) -> Result<PathBuf, RenderError> {
    if sorted.is_empty() {
        return Err(RenderError::Empty("dataset has no values"));
    }
    group.ensure_figs().map_err(|source| RenderError::Io {
        path: group.figs_dir(),
        source,
    })?;
    let path = group.figure_path(name);
    draw_or_discard(&path, |p| draw_density(p, name, sorted, breaks, size))?;
    Ok(path)
}

fn draw_density(
    path: &Path,
    caption: &str,
    sorted: &[f64],
    breaks: &BreakSet,
    size: FigureSize,
) -> Result<(), RenderError> {
    let h = scott_bandwidth(sorted);
    let data_lo = breaks.lower().map_or(sorted[0], |b| b.min(sorted[0]));
    let data_hi = breaks
        .upper()
        .map_or(sorted[sorted.len() - 1], |b| b.max(sorted[sorted.len() - 1]));
    let (lo, hi) = (data_lo - CUT * h, data_hi + CUT * h);

    let curve = density_curve(sorted, h, lo, hi);
    let peak = curve.iter().map(|&(_, y)| y).fold(0.0, f64::max);
    let top = if peak > 0.0 { peak * 1.05 } else { 1.0 };

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(16)
        .caption(caption, (FONT_FAMILY, 18))
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(lo..hi, 0.0..top)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("value")
        .y_desc("density")
        .label_style((FONT_FAMILY, 12))
        .axis_desc_style((FONT_FAMILY, 14))
        .draw()?;
    chart.draw_series(LineSeries::new(curve, BLUE.stroke_width(2)))?;

    let dash = top / (2 * DASHES) as f64;
    for b in breaks.iter() {
        chart.draw_series((0..DASHES).map(|i| {
            let y0 = dash * (2 * i) as f64;
            PathElement::new(vec![(b, y0), (b, y0 + dash)], RED.stroke_width(1))
        }))?;
    }

    root.present()?;
    Ok(())
}
