use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::model::{BreakSet, OutputGroup};

/// Write `breaks` to `res/<name>.jen`, one value per line, replacing any
/// previous file. Returns the path written.
///
/// Values use the shortest representation that parses back to the same
/// `f64`, so unchanged input always produces byte-identical files.
pub fn write_breaks(group: &OutputGroup, name: &str, breaks: &BreakSet) -> io::Result<PathBuf> {
    group.ensure_res()?;
    let path = group.breaks_path(name);

    let mut out = BufWriter::new(File::create(&path)?);
    for value in breaks.iter() {
        writeln!(out, "{value}")?;
    }
    out.flush()?;
    Ok(path)
}

/// Parse a breakpoint file written by [`write_breaks`]. Blank lines are ignored.
pub fn read_breaks(path: &Path) -> io::Result<Vec<f64>> {
    fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: {line:?}: {e}", path.display()),
                )
            })
        })
        .collect()
}
