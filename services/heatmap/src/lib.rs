//! Trackpoint heatmap rendering over slippy-map tiles.
//!
//! Ties the workspace crates together:
//! - [`config`]: run configuration loaded from YAML/JSON
//! - [`fetch`]: HTTP tile fetching with an on-disk cache
//! - [`pipeline`]: crop, tile gate, mosaic, density, smoothing, compositing
//! - [`export`]: PNG and CSV writers

pub mod config;
pub mod export;
pub mod fetch;
pub mod pipeline;

pub use config::HeatmapConfig;
pub use fetch::{HttpTileFetcher, TileCache, TileFetcher};
pub use pipeline::{HeatmapOutput, HeatmapPipeline, RenderRequest};
