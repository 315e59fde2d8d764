use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::error::DatasetError;

use super::model::{Dataset, is_output_dir};

/// Extension of dataset files when none is configured.
pub const DEFAULT_EXTENSION: &str = "txt";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Lazily walk `root` and yield one [`Dataset`] per file ending in `.{extension}`.
///
/// Order is deterministic: inside each directory entries are sorted by name,
/// files are yielded before the directory's sub-directories are entered.
/// Generated `res/` and `figs/` directories are never descended into, and
/// symbolic links to directories are not followed.
pub fn scan(root: &Path, extension: &str) -> DatasetScan {
    let walk = WalkDir::new(root)
        .sort_by(files_first)
        .into_iter()
        .filter_entry(keep_entry as fn(&DirEntry) -> bool);
    DatasetScan {
        root: root.to_path_buf(),
        extension: extension.trim_start_matches('.').to_string(),
        walk,
    }
}

/// Read and parse a single dataset file.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values = read_values(file, path)?;
    Ok(Dataset::new(path, values))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Layout: one or more comma-separated rows, concatenated in order.
/// The very last field is a sentinel (often `X` or empty) and is dropped;
/// every remaining field must be a finite float.
///
/// `path` is only used for error reporting.
pub fn parse_values(text: &str, path: &Path) -> Result<Vec<f64>, DatasetError> {
    read_values(text.as_bytes(), path)
}

/// Fields are read as raw bytes so that undecodable content is reported as
/// a malformed field instead of a read failure.
fn read_values<R: Read>(source: R, path: &Path) -> Result<Vec<f64>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut fields: Vec<Vec<u8>> = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        fields.extend(record.iter().map(<[u8]>::to_vec));
    }
    fields.pop();

    fields
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            std::str::from_utf8(raw)
                .ok()
                .and_then(|field| field.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(|| DatasetError::Malformed {
                    path: path.to_path_buf(),
                    index,
                    field: String::from_utf8_lossy(raw).into_owned(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Directory walk
// ---------------------------------------------------------------------------

/// Files sort before directories, then by name.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    a_dir.cmp(&b_dir).then_with(|| a.file_name().cmp(b.file_name()))
}

fn keep_entry(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !(entry.file_type().is_dir() && is_output_dir(entry.path()))
}

/// Iterator returned by [`scan`]. Directories are read on demand.
pub struct DatasetScan {
    root: PathBuf,
    extension: String,
    walk: FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>,
}

impl DatasetScan {
    fn matches(&self, entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        is_file
            && entry.path().extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }
}

impl Iterator for DatasetScan {
    type Item = Result<Dataset, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walk.next()? {
                Ok(entry) if self.matches(&entry) => return Some(load_dataset(entry.path())),
                Ok(_) => continue,
                Err(source) => {
                    let path = source.path().unwrap_or(&self.root).to_path_buf();
                    return Some(Err(DatasetError::Walk { path, source }));
                }
            }
        }
    }
}
