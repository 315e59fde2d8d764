use std::fmt;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Sub-directory receiving the `.jen` breakpoint files.
pub const RES_DIR: &str = "res";
/// Sub-directory receiving the density figures.
pub const FIGS_DIR: &str = "figs";
/// Extension of breakpoint artifacts.
pub const BREAKS_EXTENSION: &str = "jen";
/// Extension of rendered figures.
pub const FIGURE_EXTENSION: &str = "png";

// ---------------------------------------------------------------------------
// Dataset – one parsed input file
// ---------------------------------------------------------------------------

/// A flat numeric sequence loaded from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// The file the values came from.
    pub source: PathBuf,
    /// Directory containing `source`; outputs are written below it.
    pub dir: PathBuf,
    /// File stem, used to name every artifact derived from this dataset.
    pub name: String,
    /// Values in file order.
    pub values: Vec<f64>,
}

impl Dataset {
    pub fn new(source: &Path, values: Vec<f64>) -> Self {
        let dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Dataset {
            source: source.to_path_buf(),
            dir,
            name,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn output_group(&self) -> OutputGroup {
        OutputGroup::new(&self.dir)
    }
}

// ---------------------------------------------------------------------------
// ClassCount
// ---------------------------------------------------------------------------

/// Number of natural-break classes requested for a run. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassCount(NonZeroUsize);

impl ClassCount {
    pub fn new(classes: usize) -> Option<Self> {
        NonZeroUsize::new(classes).map(ClassCount)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl FromStr for ClassCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("{s:?} is not a positive integer"))?;
        ClassCount::new(n).ok_or_else(|| "class count must be at least 1".to_string())
    }
}

impl fmt::Display for ClassCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BreakSet
// ---------------------------------------------------------------------------

/// Natural-break boundaries of one dataset.
///
/// Holds `classes + 1` non-decreasing values: the dataset minimum, the upper
/// bound of every class but the last, and the dataset maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakSet(Vec<f64>);

impl BreakSet {
    pub fn new(breaks: Vec<f64>) -> Self {
        debug_assert!(breaks.windows(2).all(|w| w[0] <= w[1]));
        BreakSet(breaks)
    }

    /// Number of classes the breaks delimit.
    pub fn classes(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn lower(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn upper(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// OutputGroup – res/ and figs/ beside the datasets
// ---------------------------------------------------------------------------

/// The `res/` and `figs/` directories belonging to one source directory.
/// Nothing is created until a writer asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGroup {
    base: PathBuf,
}

impl OutputGroup {
    pub fn new(source_dir: &Path) -> Self {
        OutputGroup {
            base: source_dir.to_path_buf(),
        }
    }

    pub fn res_dir(&self) -> PathBuf {
        self.base.join(RES_DIR)
    }

    pub fn figs_dir(&self) -> PathBuf {
        self.base.join(FIGS_DIR)
    }

    pub fn breaks_path(&self, name: &str) -> PathBuf {
        self.res_dir().join(format!("{name}.{BREAKS_EXTENSION}"))
    }

    pub fn figure_path(&self, name: &str) -> PathBuf {
        self.figs_dir().join(format!("{name}.{FIGURE_EXTENSION}"))
    }

    /// Create `res/` if needed. An existing directory is not an error.
    pub fn ensure_res(&self) -> io::Result<PathBuf> {
        let dir = self.res_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Create `figs/` if needed. An existing directory is not an error.
    pub fn ensure_figs(&self) -> io::Result<PathBuf> {
        let dir = self.figs_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Whether `dir` is one of the generated output directories.
pub fn is_output_dir(dir: &Path) -> bool {
    matches!(
        dir.file_name().and_then(|n| n.to_str()),
        Some(RES_DIR) | Some(FIGS_DIR)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_count_rejects_zero() {
        assert!(ClassCount::new(0).is_none());
        assert!("0".parse::<ClassCount>().is_err());
        assert!("three".parse::<ClassCount>().is_err());
        assert_eq!("4".parse::<ClassCount>().unwrap().get(), 4);
    }

    #[test]
    fn dataset_is_named_after_file_stem() {
        let ds = Dataset::new(Path::new("root/spkr1/aa.txt"), vec![1.0]);
        assert_eq!(ds.name, "aa");
        assert_eq!(ds.dir, Path::new("root/spkr1"));
        assert_eq!(
            ds.output_group().breaks_path(&ds.name),
            Path::new("root/spkr1/res/aa.jen")
        );
        assert_eq!(
            ds.output_group().figure_path(&ds.name),
            Path::new("root/spkr1/figs/aa.png")
        );
    }

    #[test]
    fn break_set_counts_classes() {
        let breaks = BreakSet::new(vec![1.0, 4.0, 7.0, 10.0]);
        assert_eq!(breaks.classes(), 3);
        assert_eq!(breaks.lower(), Some(1.0));
        assert_eq!(breaks.upper(), Some(10.0));
    }

    #[test]
    fn recognises_output_dirs() {
        assert!(is_output_dir(Path::new("a/b/res")));
        assert!(is_output_dir(Path::new("figs")));
        assert!(!is_output_dir(Path::new("a/resources")));
    }
}
