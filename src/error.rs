use std::io;
use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Run-level errors (fatal)
// ---------------------------------------------------------------------------

/// Errors that abort a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration, detected before any dataset is touched.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Too many datasets in a row failed with I/O errors (disk full, read-only tree, ...).
    #[error("aborting after {count} consecutive I/O failures, last: {last}")]
    IoEscalation { count: usize, last: String },
}

// ---------------------------------------------------------------------------
// Per-dataset errors (recoverable)
// ---------------------------------------------------------------------------

/// A dataset file could not be turned into a numeric sequence.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{}: field {index} ({field:?}) is not a finite number", path.display())]
    Malformed {
        path: PathBuf,
        index: usize,
        field: String,
    },

    #[error("{}: invalid CSV", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("listing {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl DatasetError {
    pub fn path(&self) -> &Path {
        match self {
            DatasetError::Malformed { path, .. }
            | DatasetError::Csv { path, .. }
            | DatasetError::Io { path, .. }
            | DatasetError::Walk { path, .. } => path,
        }
    }

    /// Whether the filesystem failed, as opposed to the file's content.
    pub fn is_io(&self) -> bool {
        match self {
            DatasetError::Io { .. } | DatasetError::Walk { .. } => true,
            DatasetError::Csv { source, .. } => source.is_io_error(),
            DatasetError::Malformed { .. } => false,
        }
    }
}

/// Preconditions of the breakpoint classifier.
#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("class count {classes} exceeds dataset size {len}")]
    InvalidClassCount { classes: usize, len: usize },

    #[error("value at index {index} is not finite")]
    NonFinite { index: usize },

    #[error("break computation failed: {0}")]
    Backend(String),
}

/// Failure while drawing or saving a figure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("creating {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("nothing to draw: {0}")]
    Empty(&'static str),
}

impl<E> From<DrawingAreaErrorKind<E>> for RenderError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

/// Why a dataset was skipped during a run.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("writing breakpoints to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl SkipReason {
    /// Whether the failure came from the filesystem rather than the data.
    /// Only these count towards [`PipelineError::IoEscalation`].
    pub fn is_io(&self) -> bool {
        match self {
            SkipReason::Dataset(err) => err.is_io(),
            SkipReason::Write { .. } => true,
            SkipReason::Render(RenderError::Io { .. } | RenderError::Draw(_)) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Confusion matrix / DTW runner
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfusionError {
    #[error("line {line}: cell {column} ({text:?}) is not a number")]
    Cell {
        line: usize,
        column: usize,
        text: String,
    },

    #[error("line {line}: expected {expected} cells, found {found}")]
    Width {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("confusion matrix is empty")]
    Empty,

    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DtwError {
    #[error("unknown parameter {0:?}")]
    UnknownParameter(String),

    #[error("parameter {name}: {text:?} is not an integer")]
    InvalidValue { name: String, text: String },

    #[error("failed to launch {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("preset {}", path.display())]
    PresetIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("preset {} is not valid JSON", path.display())]
    PresetFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Feature analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{}: row {row}: {reason}", path.display())]
    Row {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("{}: CSV error", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no feature rows found under {}", .0.display())]
    NoData(PathBuf),

    #[error("need at least two phoneme classes, found {0}")]
    TooFewClasses(usize),

    #[error("{stage} failed: {message}")]
    Model { stage: &'static str, message: String },

    #[error("listing {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("writing {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Render an error and its sources on one line, `outer: inner: root`.
pub fn chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
