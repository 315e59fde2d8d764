use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_MAX_IO_FAILURES, DEFAULT_ROOT, PipelineConfig};
use crate::data::loader::DEFAULT_EXTENSION;
use crate::data::model::ClassCount;
use crate::render::FigureSize;

/// Compute Jenks natural breaks for every dataset under a directory tree.
///
/// For each `<dir>/<name>.txt` the breakpoints are written to
/// `<dir>/res/<name>.jen` and a density plot to `<dir>/figs/<name>.png`.
#[derive(Parser, Debug)]
#[command(name = "jenks", version)]
pub struct JenksCli {
    /// Number of natural-break classes per dataset (positive integer).
    #[arg(value_name = "CLASS_COUNT")]
    pub class_count: ClassCount,

    /// Directory tree to scan.
    #[arg(long, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Extension of dataset files.
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Only write breakpoint files, skip the density figures.
    #[arg(long)]
    pub no_figures: bool,

    /// Abort after this many datasets in a row fail with I/O errors.
    #[arg(long = "max-io-failures", default_value_t = DEFAULT_MAX_IO_FAILURES)]
    pub max_io_failures: usize,

    /// Figure width in pixels.
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Figure height in pixels.
    #[arg(long, default_value_t = 480)]
    pub height: u32,
}

impl JenksCli {
    pub fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.root, self.class_count)
            .with_extension(&self.extension)
            .with_figures(!self.no_figures);
        config.figure_size = FigureSize {
            width: self.width,
            height: self.height,
        };
        config.max_consecutive_io_failures = self.max_io_failures;
        config
    }
}

/// Render a DTW confusion matrix as a heatmap image.
#[derive(Parser, Debug)]
#[command(name = "confusion", version)]
pub struct ConfusionCli {
    /// Confusion matrix written by the DTW executable.
    #[arg(value_name = "MATRIX", default_value = crate::data::confusion::CONFUSION_FILE)]
    pub matrix: PathBuf,

    /// Output image; defaults to `figs/<matrix stem>.png` beside the input.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ConfusionCli {
    pub fn output_path(&self) -> PathBuf {
        if let Some(out) = &self.output {
            return out.clone();
        }
        let stem = self
            .matrix
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "confusion_matrix".to_string());
        let dir = self.matrix.parent().map(PathBuf::from).unwrap_or_default();
        dir.join(crate::data::model::FIGS_DIR).join(format!("{stem}.png"))
    }
}

/// Fit PCA, K-means and one-vs-rest linear SVMs on MFCC feature tables.
///
/// Every `*.txt` file under ROOT holds rows of coefficients followed by the
/// phoneme label. Results go to `loadings.org`, `kmeans.org`, `weights.org`
/// and `constants.org` in the output directory.
#[derive(Parser, Debug)]
#[command(name = "pca", version)]
pub struct PcaCli {
    /// Directory tree of feature tables.
    #[arg(value_name = "ROOT", default_value = crate::analysis::DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Number of K-means clusters (capped at the row count).
    #[arg(long, default_value_t = crate::analysis::DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Directory for the `.org` tables.
    #[arg(long, short, default_value = crate::data::model::RES_DIR)]
    pub output: PathBuf,
}
