//! Feature-space analysis of per-frame MFCC tables.
//!
//! Every `*.txt` file under the root holds comma-separated rows of cepstral
//! coefficients followed by the phoneme label. All rows are stacked into one
//! [`FeatureTable`] and [`analyse`] fits three models on it:
//!
//! * a two-component PCA, reported as loadings (components scaled by the
//!   square root of their explained variance);
//! * K-means on the PCA projection;
//! * one linear SVM per phoneme (one-vs-rest) on min-max scaled features.
//!
//! [`write_results`] stores them as `.org` tables under `res/`.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use linfa_reduction::Pca;
use linfa_svm::Svm;
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use walkdir::WalkDir;

use crate::data::model::is_output_dir;
use crate::error::AnalysisError;

/// Directory scanned when none is given.
pub const DEFAULT_ROOT: &str = "../PCA_Data/";
/// K-means cluster count when none is given.
pub const DEFAULT_CLUSTERS: usize = 38;
/// Number of principal components kept.
pub const COMPONENTS: usize = 2;
/// Seed for K-means initialisation, so reruns give the same centres.
const KMEANS_SEED: u64 = 0;

pub const LOADINGS_FILE: &str = "loadings.org";
pub const KMEANS_FILE: &str = "kmeans.org";
pub const WEIGHTS_FILE: &str = "weights.org";
pub const CONSTANTS_FILE: &str = "constants.org";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Stacked feature rows and their phoneme labels.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub features: Array2<f64>,
    pub labels: Vec<String>,
}

impl FeatureTable {
    /// Read every `*.txt` file under `root` (sorted, `res/` and `figs/`
    /// excluded) and stack their rows.
    pub fn load_dir(root: &Path) -> Result<Self, AnalysisError> {
        let mut rows = RowBuffer::default();
        let walk = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && is_output_dir(e.path())));
        for entry in walk {
            let entry = entry.map_err(|source| AnalysisError::Walk {
                path: source.path().unwrap_or(root).to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let file = File::open(path).map_err(|source| AnalysisError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            rows.read(file, path)?;
        }
        rows.finish(root)
    }

    /// Parse a single table. `path` is only used for error reporting.
    pub fn parse(text: &str, path: &Path) -> Result<Self, AnalysisError> {
        let mut rows = RowBuffer::default();
        rows.read(text.as_bytes(), path)?;
        rows.finish(path)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct labels in sorted order.
    pub fn classes(&self) -> Vec<String> {
        let mut classes = self.labels.clone();
        classes.sort();
        classes.dedup();
        classes
    }
}

#[derive(Default)]
struct RowBuffer {
    width: Option<usize>,
    values: Vec<f64>,
    labels: Vec<String>,
}

impl RowBuffer {
    fn read<R: Read>(&mut self, reader: R, path: &Path) -> Result<(), AnalysisError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|source| AnalysisError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let row = index + 1;
            let bad = |reason: String| AnalysisError::Row {
                path: path.to_path_buf(),
                row,
                reason,
            };
            if record.iter().all(str::is_empty) {
                continue;
            }
            let fields: Vec<&str> = record.iter().collect();
            let Some((label, coefficients)) = fields.split_last() else {
                continue;
            };
            if coefficients.is_empty() {
                return Err(bad("no coefficients before the label".into()));
            }
            let width = *self.width.get_or_insert(coefficients.len());
            if coefficients.len() != width {
                return Err(bad(format!("expected {width} coefficients, found {}", coefficients.len())));
            }
            for field in coefficients {
                let value = field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| bad(format!("not a finite number: {field:?}")))?;
                self.values.push(value);
            }
            self.labels.push(label.to_string());
        }
        Ok(())
    }

    fn finish(self, origin: &Path) -> Result<FeatureTable, AnalysisError> {
        let width = match self.width {
            Some(width) if !self.labels.is_empty() => width,
            _ => return Err(AnalysisError::NoData(origin.to_path_buf())),
        };
        let features = Array2::from_shape_vec((self.labels.len(), width), self.values).map_err(|e| {
            AnalysisError::Model {
                stage: "table",
                message: e.to_string(),
            }
        })?;
        Ok(FeatureTable {
            features,
            labels: self.labels,
        })
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Everything [`write_results`] stores.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// One row per coefficient, one column per component.
    pub loadings: Array2<f64>,
    pub explained_variance_ratio: Array1<f64>,
    /// K-means centres in PCA space.
    pub centroids: Array2<f64>,
    /// Row order of `weights` and `intercepts`.
    pub classes: Vec<String>,
    /// One row per class, one column per coefficient.
    pub weights: Array2<f64>,
    pub intercepts: Array1<f64>,
}

/// Fit PCA, K-means (`clusters` centres, capped at the row count) and the
/// one-vs-rest linear SVMs.
pub fn analyse(table: &FeatureTable, clusters: usize) -> Result<Analysis, AnalysisError> {
    let classes = table.classes();
    if classes.len() < 2 {
        return Err(AnalysisError::TooFewClasses(classes.len()));
    }
    let width = table.features.ncols();
    info!(
        "Analysing {} rows of {width} coefficients across {} phonemes",
        table.len(),
        classes.len()
    );

    // PCA
    let dataset = DatasetBase::from(table.features.clone());
    let pca = Pca::params(COMPONENTS.min(width))
        .fit(&dataset)
        .map_err(|e| model_error("PCA", e))?;
    let projection: Array2<f64> = pca.predict(&table.features);
    let loadings = linear_map(width, |rows| pca.predict(rows))
        * pca.explained_variance().mapv(f64::sqrt);
    debug!("explained variance ratio {}", pca.explained_variance_ratio());

    // K-means
    let clusters = clusters.clamp(1, table.len());
    let kmeans = KMeans::params_with_rng(clusters, Xoshiro256Plus::seed_from_u64(KMEANS_SEED))
        .fit(&DatasetBase::from(projection))
        .map_err(|e| model_error("K-means", e))?;

    // One-vs-rest SVMs
    let scaled = min_max_scale(&table.features);
    let mut weights = Array2::zeros((classes.len(), width));
    let mut intercepts = Array1::zeros(classes.len());
    for (c, class) in classes.iter().enumerate() {
        let targets = Array1::from_iter(table.labels.iter().map(|label| label == class));
        let svm = Svm::<_, bool>::params()
            .linear_kernel()
            .fit(&DatasetBase::new(scaled.clone(), targets))
            .map_err(|e| model_error("SVM", e))?;
        for j in 0..width {
            let mut basis = Array1::zeros(width);
            basis[j] = 1.0;
            weights[[c, j]] = svm.weighted_sum(&basis);
        }
        intercepts[c] = -svm.rho;
        debug!("SVM for {class}: {} support vectors", svm.nsupport());
    }

    Ok(Analysis {
        loadings,
        explained_variance_ratio: pca.explained_variance_ratio(),
        centroids: kmeans.centroids().clone(),
        classes,
        weights,
        intercepts,
    })
}

fn model_error(stage: &'static str, err: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Model {
        stage,
        message: err.to_string(),
    }
}

/// Matrix of an affine map `f` with its offset removed: row `i` is
/// `f(e_i) - f(0)`.
fn linear_map(width: usize, f: impl Fn(&Array2<f64>) -> Array2<f64>) -> Array2<f64> {
    let basis = f(&Array2::eye(width));
    let origin = f(&Array2::zeros((1, width)));
    basis - &origin.row(0)
}

/// Scale each column to `[0, 1]`. Constant columns become zero.
pub fn min_max_scale(features: &Array2<f64>) -> Array2<f64> {
    let mut scaled = features.clone();
    for mut column in scaled.axis_iter_mut(Axis(1)) {
        let min = column.fold(f64::INFINITY, |a, &b| a.min(b));
        let max = column.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let span = max - min;
        column.mapv_inplace(|v| if span > 0.0 { (v - min) / span } else { 0.0 });
    }
    scaled
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Write the four `.org` tables into `res_dir` (created if missing).
///
/// Loadings and K-means centres are comma-separated; SVM weights (one row
/// per class in [`Analysis::classes`] order) and intercepts (a single row)
/// are space-separated.
pub fn write_results(analysis: &Analysis, res_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    fs::create_dir_all(res_dir).map_err(|source| AnalysisError::Io {
        path: res_dir.to_path_buf(),
        source,
    })?;

    let intercepts = analysis.intercepts.view().insert_axis(Axis(0));
    let tables = [
        (LOADINGS_FILE, analysis.loadings.view(), b','),
        (KMEANS_FILE, analysis.centroids.view(), b','),
        (WEIGHTS_FILE, analysis.weights.view(), b' '),
        (CONSTANTS_FILE, intercepts, b' '),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, table, delimiter) in tables {
        let path = res_dir.join(name);
        write_table(&path, table, delimiter)?;
        written.push(path);
    }
    Ok(written)
}

fn write_table(path: &Path, table: ndarray::ArrayView2<'_, f64>, delimiter: u8) -> Result<(), AnalysisError> {
    let csv_error = |source: csv::Error| AnalysisError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(csv_error)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
