//! Run configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Files ending in `.yaml`/`.yml` are read as YAML, `.json` as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use heatmap_common::tile::{DEFAULT_TILE_SIZE, MAX_ZOOM};
use heatmap_common::{HeatmapError, HeatmapResult};
use renderer::density::DEFAULT_METERS_PER_TRACKPOINT;
use renderer::Colormap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Wikimedia OSM tiles.
pub const DEFAULT_TILE_URL: &str = "https://maps.wikimedia.org/osm-intl/{z}/{x}/{y}.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Colormap name (hot, afmhot, gist_heat, gray)
    pub colormap: String,
    pub tile_size: u32,
    /// Requested zooms above this are clamped
    pub max_zoom: u32,
    /// Maximum number of tiles a single render may cover
    pub max_tile_count: u64,
    /// Assumed recording density used by the cumulative ceiling
    pub meters_per_trackpoint: f64,
    /// Minimum normalized density exported to CSV
    pub csv_threshold: f64,
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders
    pub tile_url: String,
    pub user_agent: String,
    /// Pause after each network tile fetch
    pub fetch_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub tile_cache_dir: PathBuf,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            colormap: Colormap::Hot.name().to_string(),
            tile_size: DEFAULT_TILE_SIZE,
            max_zoom: MAX_ZOOM,
            max_tile_count: 100,
            meters_per_trackpoint: DEFAULT_METERS_PER_TRACKPOINT,
            csv_threshold: 0.1,
            tile_url: DEFAULT_TILE_URL.to_string(),
            user_agent: format!("local-heatmap/{}", env!("CARGO_PKG_VERSION")),
            fetch_delay_ms: 100,
            request_timeout_secs: 30,
            tile_cache_dir: PathBuf::from("tiles"),
        }
    }
}

impl HeatmapConfig {
    /// Load from a YAML or JSON file, chosen by extension.
    pub fn load(path: &Path) -> HeatmapResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HeatmapError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let config: HeatmapConfig = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                HeatmapError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(HeatmapError::Config(format!(
                    "{}: expected a .yaml, .yml or .json file",
                    path.display()
                )))
            }
        };

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> HeatmapResult<()> {
        self.colormap()?;

        if self.tile_size == 0 {
            return Err(HeatmapError::invalid_parameter(
                "tile_size",
                "must be greater than 0",
            ));
        }
        if self.max_zoom > MAX_ZOOM {
            return Err(HeatmapError::invalid_parameter(
                "max_zoom",
                format!("must be at most {}", MAX_ZOOM),
            ));
        }
        if self.max_tile_count == 0 {
            return Err(HeatmapError::invalid_parameter(
                "max_tile_count",
                "must be greater than 0",
            ));
        }
        if !(self.meters_per_trackpoint.is_finite() && self.meters_per_trackpoint > 0.0) {
            return Err(HeatmapError::invalid_parameter(
                "meters_per_trackpoint",
                "must be a positive number",
            ));
        }
        if !(0.0..1.0).contains(&self.csv_threshold) {
            return Err(HeatmapError::invalid_parameter(
                "csv_threshold",
                "must be in [0, 1)",
            ));
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.tile_url.contains(placeholder) {
                return Err(HeatmapError::invalid_parameter(
                    "tile_url",
                    format!("missing {} placeholder", placeholder),
                ));
            }
        }
        Ok(())
    }

    pub fn colormap(&self) -> HeatmapResult<Colormap> {
        self.colormap.parse()
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
