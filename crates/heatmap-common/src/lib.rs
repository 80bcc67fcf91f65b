//! Common types and utilities shared across the heatmap crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod tile;
pub mod track;

pub use bbox::BoundingBox;
pub use error::{HeatmapError, HeatmapResult};
pub use grid::Grid;
pub use tile::{TileCoord, TileRange};
pub use track::{TrackPoint, TrackSet};
