//! PNG output through the raster canvas.

use anyhow::{Context, Result};
use patterngen::canvas::{Canvas, RasterCanvas};
use patterngen::geometry::{Page, Unit};
use std::path::Path;

const MM_PER_INCH: f64 = 25.4;

/// Pixels per page unit: 1 for pixel pages, `dpi / 25.4` for millimetre pages.
pub fn pixels_per_unit(page: &Page, dpi: f64) -> f64 {
    match page.unit {
        Unit::Px => 1.0,
        Unit::Mm => dpi / MM_PER_INCH,
    }
}

/// Rasterise whatever `draw` paints on `page` and write it to `path`.
pub fn write_png<T>(
    page: &Page,
    dpi: f64,
    path: &Path,
    draw: impl FnOnce(&mut dyn Canvas) -> T,
) -> Result<T> {
    let mut canvas = RasterCanvas::for_page(page, pixels_per_unit(page, dpi))
        .with_context(|| format!("{page} at {dpi} dpi is too large to rasterise"))?;
    let out = draw(&mut canvas);

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    canvas
        .write_png(std::io::BufWriter::new(file))
        .with_context(|| format!("writing PNG data for {}", path.display()))?;
    log::debug!(
        "{}: {}x{} px",
        path.display(),
        canvas.width(),
        canvas.height()
    );
    Ok(out)
}
