use std::path::PathBuf;

use crate::data::loader::DEFAULT_EXTENSION;
use crate::data::model::ClassCount;
use crate::error::PipelineError;
use crate::render::FigureSize;

/// Root scanned when none is given on the command line.
pub const DEFAULT_ROOT: &str = "../Jenks/";
/// Consecutive I/O failures tolerated before a run is aborted.
pub const DEFAULT_MAX_IO_FAILURES: usize = 5;

/// Everything a Jenks batch run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub root: PathBuf,
    pub class_count: ClassCount,
    /// Extension of dataset files, without the dot.
    pub extension: String,
    /// Whether density figures are rendered next to the breakpoint files.
    pub figures: bool,
    pub figure_size: FigureSize,
    pub max_consecutive_io_failures: usize,
}

impl PipelineConfig {
    pub fn new(root: impl Into<PathBuf>, class_count: ClassCount) -> Self {
        PipelineConfig {
            root: root.into(),
            class_count,
            extension: DEFAULT_EXTENSION.to_string(),
            figures: true,
            figure_size: FigureSize::default(),
            max_consecutive_io_failures: DEFAULT_MAX_IO_FAILURES,
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_figures(mut self, figures: bool) -> Self {
        self.figures = figures;
        self
    }

    /// Check the configuration before any dataset is touched.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.root.exists() {
            return Err(PipelineError::Configuration(format!(
                "root directory {} does not exist",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            return Err(PipelineError::Configuration(format!(
                "root {} is not a directory",
                self.root.display()
            )));
        }
        if self.extension.is_empty() {
            return Err(PipelineError::Configuration(
                "dataset extension must not be empty".into(),
            ));
        }
        if self.max_consecutive_io_failures == 0 {
            return Err(PipelineError::Configuration(
                "max consecutive I/O failures must be at least 1".into(),
            ));
        }
        if self.figures && (self.figure_size.width == 0 || self.figure_size.height == 0) {
            return Err(PipelineError::Configuration(format!(
                "figure size {}x{} is empty",
                self.figure_size.width, self.figure_size.height
            )));
        }
        Ok(())
    }
}
