//! Bitmap figures.
//!
//! Every entry point builds its own `BitMapBackend` and drops it before
//! returning, so consecutive figures never share drawing state. Text is
//! rasterised by plotters' pure-Rust `ab_glyph` backend with the Ubuntu face
//! shipped in `epaint_default_fonts`, so no system fonts are needed.

pub mod density;
pub mod heatmap;

pub use density::{render_density, FigureSize};
pub use heatmap::{render_confusion_file, render_heatmap};

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};

use crate::error::RenderError;

/// Family every figure draws its text with.
pub(crate) const FONT_FAMILY: &str = "sans-serif";

/// Register the bundled face under [`FONT_FAMILY`] once per process.
fn ensure_font() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        register_font(FONT_FAMILY, FontStyle::Normal, epaint_default_fonts::UBUNTU_LIGHT).is_ok()
    });
    if ok {
        Ok(())
    } else {
        Err(RenderError::Draw("bundled font could not be loaded".into()))
    }
}

/// Run `draw`, deleting whatever it left at `path` if it failed.
fn draw_or_discard<F>(path: &Path, draw: F) -> Result<(), RenderError>
where
    F: FnOnce(&Path) -> Result<(), RenderError>,
{
    ensure_font()?;
    let result = draw(path);
    if result.is_err() && path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove partial figure {}: {e}", path.display());
        }
    }
    result
}
