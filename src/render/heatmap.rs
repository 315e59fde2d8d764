use std::fs;
use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color::HeatScale;
use crate::data::confusion::ConfusionMatrix;
use crate::error::RenderError;

use super::{draw_or_discard, FONT_FAMILY};

/// Side of one matrix cell in pixels.
const CELL_PX: u32 = 16;
/// Smallest side of the cell grid.
const MIN_SIDE_PX: u32 = 256;
/// Room for the phoneme labels left of and below the grid.
const LABEL_PX: u32 = 48;
const MAX_FONT_PX: f64 = 14.0;

/// Draw `matrix` as a square heatmap at `path`, row `i` at the top for `i = 0`.
/// Actual classes are labelled down the left edge, predicted ones along the
/// bottom. Colours are normalised from zero to the largest cell.
pub fn render_heatmap(matrix: &ConfusionMatrix, path: &Path) -> Result<(), RenderError> {
    let n = matrix.size();
    if n == 0 {
        return Err(RenderError::Empty("confusion matrix has no rows"));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RenderError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let scale = HeatScale::new(0.0, matrix.max_cell());
    let side = (CELL_PX * n as u32).max(MIN_SIDE_PX);
    let cell = f64::from(side) / n as f64;
    let font_px = (cell * 0.8).min(MAX_FONT_PX);

    draw_or_discard(path, |p| {
        let root = BitMapBackend::new(p, (LABEL_PX + side, side + LABEL_PX)).into_drawing_area();
        root.fill(&WHITE)?;
        let (upper, bottom) = root.split_vertically(side);
        let (left, grid) = upper.split_horizontally(LABEL_PX);

        let cells = grid.split_evenly((n, n));
        for (idx, area) in cells.iter().enumerate() {
            let [r, g, b] = scale.color_for(matrix.cells[idx / n][idx % n]);
            area.fill(&RGBColor(r, g, b))?;
        }

        let font = (FONT_FAMILY, font_px).into_font().color(&BLACK);
        let row_style = font.clone().pos(Pos::new(HPos::Right, VPos::Center));
        let col_style = font.pos(Pos::new(HPos::Center, VPos::Top));
        for (i, label) in matrix.labels.iter().enumerate() {
            let centre = ((i as f64 + 0.5) * cell) as i32;
            left.draw_text(label, &row_style, (LABEL_PX as i32 - 4, centre))?;
            bottom.draw_text(label, &col_style, (LABEL_PX as i32 + centre, 4))?;
        }
        root.present()?;
        Ok(())
    })
}

/// Load a confusion matrix file and render it to `output`.
pub fn render_confusion_file(input: &Path, output: &Path) -> anyhow::Result<ConfusionMatrix> {
    let matrix = ConfusionMatrix::load(input)?;
    render_heatmap(&matrix, output)?;
    log::info!(
        "rendered {}x{} confusion matrix to {}",
        matrix.size(),
        matrix.size(),
        output.display()
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_square_image() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("figs").join("matrix.png");
        let matrix = ConfusionMatrix::parse("a | 5 | 1 |\nb | 0 | 6 |\n").unwrap();

        render_heatmap(&matrix, &out).unwrap();

        let full = MIN_SIDE_PX + LABEL_PX;
        assert_eq!(image::image_dimensions(&out).unwrap(), (full, full));
    }

    #[test]
    fn large_matrices_grow_with_cell_count() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("big.png");
        let n = 40;
        let labels = (0..n).map(|i| format!("p{i}")).collect();
        let cells = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 10.0 } else { 1.0 }).collect())
            .collect();
        let matrix = ConfusionMatrix { labels, cells };

        render_heatmap(&matrix, &out).unwrap();

        let full = CELL_PX * n as u32 + LABEL_PX;
        assert_eq!(image::image_dimensions(&out).unwrap(), (full, full));
    }

    #[test]
    fn diagonal_is_brightest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diag.png");
        let matrix = ConfusionMatrix::parse("a | 9 | 0 |\nb | 0 | 9 |\n").unwrap();
        render_heatmap(&matrix, &out).unwrap();

        let img = image::open(&out).unwrap().to_rgb8();
        let quarter = MIN_SIDE_PX / 4;
        let on_diag = img.get_pixel(LABEL_PX + quarter, quarter).0;
        let off_diag = img.get_pixel(LABEL_PX + 3 * quarter, quarter).0;
        assert_eq!(on_diag, crate::color::heat(1.0));
        assert_eq!(off_diag, crate::color::heat(0.0));
    }

    #[test]
    fn labels_are_drawn_in_the_margins() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("labelled.png");
        let matrix = ConfusionMatrix::parse("aa | 9 | 0 |\niy | 0 | 9 |\n").unwrap();
        render_heatmap(&matrix, &out).unwrap();

        let img = image::open(&out).unwrap().to_rgb8();
        let white = [255, 255, 255];
        let inked = |xs: std::ops::Range<u32>, ys: std::ops::Range<u32>| {
            xs.flat_map(|x| ys.clone().map(move |y| (x, y)))
                .any(|(x, y)| img.get_pixel(x, y).0 != white)
        };
        let full = MIN_SIDE_PX + LABEL_PX;
        assert!(inked(0..LABEL_PX, 0..MIN_SIDE_PX), "row labels missing");
        assert!(inked(LABEL_PX..full, MIN_SIDE_PX..full), "column labels missing");
        // The corner below the row labels stays blank.
        assert!(!inked(0..LABEL_PX, MIN_SIDE_PX..full));
    }
}
