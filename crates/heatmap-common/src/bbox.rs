//! Bounding box types and operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic bounding box in degrees.
///
/// `x` is longitude and `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a bounding box from the `lat_min lat_max lon_min lon_max`
    /// ordering used on the command line.
    pub fn from_lat_lon(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self::new(lon_min, lat_min, lon_max, lat_max)
    }

    /// The whole globe.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Smallest box enclosing all given (lat, lon) pairs.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().fold(None, |acc, (lat, lon)| {
            Some(match acc {
                None => Self::new(lon, lat, lon, lat),
                Some(b) => Self::new(
                    b.min_x.min(lon),
                    b.min_y.min(lat),
                    b.max_x.max(lon),
                    b.max_y.max(lat),
                ),
            })
        })
    }

    /// Width of the bounding box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox (edges included).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check if a lat/lon lies strictly inside this bbox (edges excluded).
    pub fn contains_open(&self, lat: f64, lon: f64) -> bool {
        lat > self.min_y && lat < self.max_y && lon > self.min_x && lon < self.max_x
    }
}

impl fmt::Display for BoundingBox {
    /// Formats as `lat_min lat_max lon_min lon_max`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_y, self.max_y, self.min_x, self.max_x
        )
    }
}
