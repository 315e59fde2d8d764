use std::fs;
use std::path::Path;

use crate::error::ConfusionError;

/// File written by the DTW executable next to its working directory.
pub const CONFUSION_FILE: &str = "confusion_matrix.txt";

// ---------------------------------------------------------------------------
// ConfusionMatrix
// ---------------------------------------------------------------------------

/// Square matrix of classification counts: `cells[actual][predicted]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

impl ConfusionMatrix {
    /// Parse the `label | n | n | ... |` layout, one row per line.
    ///
    /// Lines with an empty label (blank lines included) are skipped. The
    /// field after the final `|` is ignored.
    pub fn parse(text: &str) -> Result<Self, ConfusionError> {
        let mut labels = Vec::new();
        let mut rows: Vec<(usize, Vec<f64>)> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let mut fields: Vec<&str> = line.split('|').map(str::trim).collect();
            let label = fields.remove(0);
            if label.is_empty() {
                continue;
            }
            if fields.last().is_some_and(|f| f.is_empty()) {
                fields.pop();
            }

            let row = fields
                .iter()
                .enumerate()
                .map(|(column, text)| {
                    text.parse::<f64>().map_err(|_| ConfusionError::Cell {
                        line: line_no,
                        column,
                        text: text.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            labels.push(label.to_string());
            rows.push((line_no, row));
        }

        if rows.is_empty() {
            return Err(ConfusionError::Empty);
        }
        let expected = rows.len();
        if let Some((line, row)) = rows.iter().find(|(_, row)| row.len() != expected) {
            return Err(ConfusionError::Width {
                line: *line,
                expected,
                found: row.len(),
            });
        }

        Ok(ConfusionMatrix {
            labels,
            cells: rows.into_iter().map(|(_, row)| row).collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfusionError> {
        let text = fs::read_to_string(path).map_err(|source| ConfusionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// Largest cell, used to normalise colours.
    pub fn max_cell(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Fraction of each row that landed on the diagonal. `None` for empty rows.
    pub fn row_accuracy(&self) -> Vec<Option<f64>> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let total: f64 = row.iter().sum();
                (total > 0.0).then(|| row[i] / total)
            })
            .collect()
    }

    /// Diagonal over the sum of all cells. `None` when the matrix is all zeros.
    pub fn overall_accuracy(&self) -> Option<f64> {
        let total: f64 = self.cells.iter().flatten().sum();
        let correct: f64 = (0..self.size()).map(|i| self.cells[i][i]).sum();
        (total > 0.0).then(|| correct / total)
    }
}
