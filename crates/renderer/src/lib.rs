//! Raster rendering for trackpoint heatmaps.
//!
//! Implements the density-rendering stages:
//! - Density accumulation with a ceiling threshold
//! - Box-filter smoothing (FFT convolution)
//! - Tile mosaic assembly and base-layer conversion
//! - Color ramps and overlay compositing
//! - PNG encoding

pub mod colormap;
pub mod composite;
pub mod density;
pub mod mosaic;
pub mod png;
pub mod raster;
pub mod smoothing;

pub use colormap::Colormap;
pub use raster::RgbRaster;
