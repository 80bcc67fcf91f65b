//! Slippy-map (Web Mercator) tile math.
//!
//! All conversions share the zoom convention `n = 2^zoom` so that tile
//! indices, global pixel coordinates and their inverse agree exactly.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Highest zoom level served by OSM-style tile servers.
pub const MAX_ZOOM: u32 = 19;

/// Latitude limit of the Web Mercator projection, in degrees.
pub const MAX_MERCATOR_LAT: f64 = 85.0511;

/// Equatorial ground resolution at zoom 0, in meters per pixel.
const EQUATOR_METERS_PER_PIXEL: f64 = 156543.03;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

fn tiles_per_axis(zoom: u32) -> f64 {
    2f64.powi(zoom as i32)
}

/// Clamp a requested zoom level to the maximum the tile source supports.
pub fn clamp_zoom(requested: u32, max_zoom: u32) -> u32 {
    requested.min(max_zoom)
}

/// Whether a latitude is inside the numerically valid Mercator band.
pub fn is_valid_mercator_lat(lat: f64) -> bool {
    lat > -MAX_MERCATOR_LAT && lat < MAX_MERCATOR_LAT
}

/// Convert lat/lon to fractional global tile coordinates.
///
/// The integer part is the tile index, the fractional part the position
/// inside that tile.
pub fn latlon_to_global_pixel(lat: f64, lon: f64, zoom: u32) -> (f64, f64) {
    let n = tiles_per_axis(zoom);
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    (x, y)
}

/// Convert lat/lon to Web Mercator tile coordinates.
///
/// Indices are clamped to the valid range so `lon = 180` maps onto the last
/// column instead of one past it.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let (x, y) = latlon_to_global_pixel(lat, lon, zoom);
    let last = (1u64 << zoom) as f64 - 1.0;

    TileCoord {
        z: zoom,
        x: x.floor().clamp(0.0, last) as u32,
        y: y.floor().clamp(0.0, last) as u32,
    }
}

/// Convert (possibly fractional) tile coordinates back to lat/lon.
///
/// Integer inputs give the north-west corner of the tile.
pub fn tile_to_latlon(x: f64, y: f64, zoom: u32) -> (f64, f64) {
    let n = tiles_per_axis(zoom);

    let lon = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Convert Web Mercator tile coordinates to lat/lon bounds.
pub fn tile_to_latlon_bounds(coord: &TileCoord) -> BoundingBox {
    let (lat_max, lon_min) = tile_to_latlon(coord.x as f64, coord.y as f64, coord.z);
    let (lat_min, lon_max) = tile_to_latlon((coord.x + 1) as f64, (coord.y + 1) as f64, coord.z);

    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
}

/// Ground resolution in meters per pixel at a latitude and zoom level.
pub fn pixel_resolution(zoom: u32, lat: f64) -> f64 {
    EQUATOR_METERS_PER_PIXEL * lat.to_radians().cos() / tiles_per_axis(zoom)
}

/// Inclusive rectangle of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub zoom: u32,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Tile range covering a geographic bounding box.
    ///
    /// Tile rows grow southwards, so the minimum latitude gives the maximum
    /// row.
    pub fn from_bbox(bbox: &BoundingBox, zoom: u32) -> Self {
        let south_west = latlon_to_tile(bbox.min_y, bbox.min_x, zoom);
        let north_east = latlon_to_tile(bbox.max_y, bbox.max_x, zoom);

        Self {
            zoom,
            x_min: south_west.x,
            x_max: north_east.x,
            y_min: north_east.y,
            y_max: south_west.y,
        }
    }

    /// Number of tile columns.
    pub fn columns(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    /// Number of tile rows.
    pub fn rows(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    /// Total number of tiles in the range.
    pub fn count(&self) -> u64 {
        self.columns() as u64 * self.rows() as u64
    }

    /// Mosaic width in pixels.
    pub fn pixel_width(&self, tile_size: u32) -> usize {
        self.columns() as usize * tile_size as usize
    }

    /// Mosaic height in pixels.
    pub fn pixel_height(&self, tile_size: u32) -> usize {
        self.rows() as usize * tile_size as usize
    }

    /// Fractional tile coordinate of the mosaic's top-left corner.
    pub fn origin(&self) -> (f64, f64) {
        (self.x_min as f64, self.y_min as f64)
    }

    /// Iterate over all tiles, column by column.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.x_min..=self.x_max).flat_map(move |x| {
            (self.y_min..=self.y_max).map(move |y| TileCoord::new(self.zoom, x, y))
        })
    }
}
