//! Per-pixel visit density accumulation.

use heatmap_common::tile::{latlon_to_global_pixel, pixel_resolution};
use heatmap_common::{Grid, TrackPoint};
use tracing::debug;

/// Default assumed recording density: one trackpoint every 5 meters.
pub const DEFAULT_METERS_PER_TRACKPOINT: f64 = 5.0;

/// Mosaic placement parameters shared by every accumulated point.
#[derive(Debug, Clone, Copy)]
pub struct DensityLayout {
    /// Grid width in pixels
    pub width: usize,
    /// Grid height in pixels
    pub height: usize,
    pub zoom: u32,
    /// Tile coordinate of the grid's top-left corner (x_min, y_min)
    pub origin: (f64, f64),
    pub tile_size: u32,
}

/// Ceiling policy applied to the accumulated counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DensityThreshold {
    /// Cap each pixel at the number of trackpoints expected to fall on it
    /// given the ground resolution and the number of activities.
    Cumulative { meters_per_trackpoint: f64 },
    /// Binary presence: every visited pixel counts as 1.
    Uniform,
}

impl Default for DensityThreshold {
    fn default() -> Self {
        DensityThreshold::Cumulative {
            meters_per_trackpoint: DEFAULT_METERS_PER_TRACKPOINT,
        }
    }
}

impl DensityThreshold {
    /// Maximum per-pixel accumulation `m`.
    pub fn ceiling(&self, zoom: u32, mean_lat: f64, activity_count: usize) -> f64 {
        match *self {
            DensityThreshold::Cumulative {
                meters_per_trackpoint,
            } => pixel_resolution(zoom, mean_lat) / meters_per_trackpoint * activity_count as f64,
            DensityThreshold::Uniform => 1.0,
        }
    }
}

/// Add 1 to the `(2·padding + 1)²` square around every point.
///
/// Pixel positions round half to even. Squares extending past the grid are
/// clipped.
pub fn accumulate(points: &[TrackPoint], layout: &DensityLayout, padding: usize) -> Grid {
    let mut grid = Grid::zeros(layout.width, layout.height);
    if layout.width == 0 || layout.height == 0 {
        return grid;
    }

    let tile_size = layout.tile_size as f64;
    let (x_min, y_min) = layout.origin;
    let pad = padding as i64;
    let max_row = layout.height as i64 - 1;
    let max_col = layout.width as i64 - 1;
    let mut clipped = 0usize;

    for point in points {
        let (x, y) = latlon_to_global_pixel(point.lat, point.lon, layout.zoom);
        let row = ((y - y_min) * tile_size).round_ties_even();
        let col = ((x - x_min) * tile_size).round_ties_even();
        if !row.is_finite() || !col.is_finite() {
            clipped += 1;
            continue;
        }
        let (row, col) = (row as i64, col as i64);

        let r0 = (row - pad).max(0);
        let r1 = (row + pad).min(max_row);
        let c0 = (col - pad).max(0);
        let c1 = (col + pad).min(max_col);
        if r0 > r1 || c0 > c1 {
            clipped += 1;
            continue;
        }

        for r in r0..=r1 {
            let start = r as usize * layout.width;
            for cell in &mut grid.data_mut()[start + c0 as usize..=start + c1 as usize] {
                *cell += 1.0;
            }
        }
    }

    if clipped > 0 {
        debug!(clipped = clipped, "Trackpoints fell entirely outside the mosaic");
    }

    grid
}

/// Clamp every cell to at most `ceiling`.
pub fn apply_ceiling(grid: &mut Grid, ceiling: f64) {
    for cell in grid.data_mut() {
        if *cell > ceiling {
            *cell = ceiling;
        }
    }
}
