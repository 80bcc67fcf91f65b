//! Density normalization, colorization and overlay compositing.

use crate::colormap::Colormap;
use crate::raster::RgbRaster;
use heatmap_common::{Grid, HeatmapError, HeatmapResult};

/// Min-max normalize to `[0, 1]`.
///
/// A constant (or empty) field normalizes to all zeros.
pub fn normalize(field: &Grid) -> Grid {
    let (width, height) = field.shape();
    let (min, max) = match field.min_max() {
        Some(bounds) => bounds,
        None => return Grid::zeros(width, height),
    };

    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return Grid::zeros(width, height);
    }

    let mut out = field.clone();
    for v in out.data_mut() {
        *v = ((*v - min) / range).clamp(0.0, 1.0);
    }
    out
}

/// Map a normalized field through `colormap`.
///
/// Pixels whose color equals the colormap's zero color are set to black,
/// so untouched areas contribute nothing to the composite.
pub fn colorize(field: &Grid, colormap: Colormap) -> RgbRaster {
    let (width, height) = field.shape();
    let lut = colormap.lut();
    let background = lut.background();

    let mut out = RgbRaster::new(width, height);
    for (px, &v) in out.data_mut().chunks_exact_mut(3).zip(field.data()) {
        let rgb = lut.map(v);
        if rgb != background {
            px.copy_from_slice(&rgb);
        }
    }
    out
}

/// Blend `overlay` onto `base` using the overlay itself as opacity:
/// `out = (1 - o)·b + o` per channel.
pub fn composite(base: &RgbRaster, overlay: &RgbRaster) -> HeatmapResult<RgbRaster> {
    if base.shape() != overlay.shape() {
        return Err(HeatmapError::Render(format!(
            "overlay is {}x{} but base is {}x{}",
            overlay.width(),
            overlay.height(),
            base.width(),
            base.height()
        )));
    }

    let mut out = base.clone();
    for (b, &o) in out.data_mut().iter_mut().zip(overlay.data()) {
        *b = ((1.0 - o) * *b + o).clamp(0.0, 1.0);
    }
    Ok(out)
}
