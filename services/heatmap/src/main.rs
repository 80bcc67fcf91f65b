//! Local trackpoint heatmap generator.
//!
//! Reads GPX activity files, overlays a visit-density heatmap on
//! OpenStreetMap tiles and writes a PNG (and optionally a CSV of the
//! density field).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use heatmap::export::{csv_output_path, png_output_path, write_csv_file, write_png};
use heatmap::{HeatmapConfig, HeatmapPipeline, HttpTileFetcher, RenderRequest, TileCache};
use heatmap_common::{BoundingBox, HeatmapError};
use renderer::density::DensityThreshold;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use track_reader::{GpxSource, TrackSource, YearFilter};

#[derive(Parser, Debug)]
#[command(name = "heatmap")]
#[command(about = "Generate a local heatmap from GPX activity files")]
struct Args {
    /// Directory containing the activity files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Glob pattern for activity file names
    #[arg(long, default_value = "*.gpx")]
    gpx_filter: String,

    /// Only use activities from this year, or "all"
    #[arg(long, default_value = "all")]
    year: YearFilter,

    /// Heatmap bounding box
    #[arg(
        long,
        num_args = 4,
        value_names = ["LAT_MIN", "LAT_MAX", "LON_MIN", "LON_MAX"],
        allow_negative_numbers = true,
        default_values_t = [-90.0, 90.0, -180.0, 180.0]
    )]
    bound: Vec<f64>,

    /// Output image file (always written as PNG)
    #[arg(long, default_value = "heatmap.png")]
    output: PathBuf,

    /// Tile zoom level (clamped to the configured maximum)
    #[arg(long, default_value = "10")]
    zoom: u32,

    /// Gaussian kernel sigma in pixels
    #[arg(long, default_value = "1")]
    sigma: u32,

    /// Disable the cumulative distribution ceiling (every visited pixel counts once)
    #[arg(long)]
    no_cdist: bool,

    /// Also write the density field to a CSV file
    #[arg(long)]
    csv: bool,

    /// Configuration file (YAML or JSON)
    #[arg(long, env = "HEATMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Colormap (hot, afmhot, gist_heat, gray)
    #[arg(long)]
    colormap: Option<String>,

    /// Tile URL template with {z}, {x} and {y} placeholders
    #[arg(long, env = "HEATMAP_TILE_URL")]
    tile_url: Option<String>,

    /// Directory for cached tiles
    #[arg(long)]
    tile_cache_dir: Option<PathBuf>,

    /// Maximum number of tiles per heatmap
    #[arg(long)]
    max_tile_count: Option<u64>,

    /// Assumed distance between recorded trackpoints, in meters
    #[arg(long)]
    meters_per_trackpoint: Option<f64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// File configuration with command-line overrides applied.
    fn config(&self) -> Result<HeatmapConfig> {
        let mut config = match &self.config {
            Some(path) => HeatmapConfig::load(path)?,
            None => HeatmapConfig::default(),
        };

        if let Some(colormap) = &self.colormap {
            config.colormap = colormap.clone();
        }
        if let Some(url) = &self.tile_url {
            config.tile_url = url.clone();
        }
        if let Some(dir) = &self.tile_cache_dir {
            config.tile_cache_dir = dir.clone();
        }
        if let Some(max) = self.max_tile_count {
            config.max_tile_count = max;
        }
        if let Some(meters) = self.meters_per_trackpoint {
            config.meters_per_trackpoint = meters;
        }

        config.validate()?;
        Ok(config)
    }

    fn request(&self, config: &HeatmapConfig) -> RenderRequest {
        let threshold = if self.no_cdist {
            DensityThreshold::Uniform
        } else {
            DensityThreshold::Cumulative {
                meters_per_trackpoint: config.meters_per_trackpoint,
            }
        };

        RenderRequest {
            zoom: self.zoom,
            sigma: self.sigma,
            bounds: BoundingBox::from_lat_lon(
                self.bound[0],
                self.bound[1],
                self.bound[2],
                self.bound[3],
            ),
            threshold,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.config()?;
    let request = args.request(&config);

    let source = GpxSource::new(&args.data_dir, &args.gpx_filter, args.year);
    let tracks = source
        .read_tracks()
        .with_context(|| format!("Failed to read tracks from {}", args.data_dir.display()))?;
    if tracks.is_empty() {
        return Err(HeatmapError::NoTrackPoints(source.describe()).into());
    }

    let fetcher = TileCache::new(config.tile_cache_dir.clone(), HttpTileFetcher::new(&config)?);
    let csv_threshold = config.csv_threshold;
    let pipeline = HeatmapPipeline::new(config, fetcher)?;

    let output = pipeline.render(&tracks, &request).await?;

    let png_path = png_output_path(&args.output);
    write_png(&png_path, &output.image)
        .with_context(|| format!("Failed to write {}", png_path.display()))?;

    if args.csv {
        let csv_path = csv_output_path(&png_path);
        write_csv_file(&csv_path, &output, csv_threshold)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    }

    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::bounds;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["heatmap"]);
        let (lat_min, lat_max, lon_min, lon_max) = bounds::WORLD;
        assert_eq!(args.bound, vec![lat_min, lat_max, lon_min, lon_max]);
        assert_eq!(args.zoom, 10);
        assert_eq!(args.sigma, 1);
        assert_eq!(args.year, YearFilter::All);
        assert_eq!(args.output, PathBuf::from("heatmap.png"));
    }

    #[test]
    fn test_negative_bounds_and_overrides() {
        let args = Args::parse_from([
            "heatmap",
            "--bound",
            "-34.1",
            "-33.8",
            "18.3",
            "18.6",
            "--no-cdist",
            "--year",
            "2021",
            "--colormap",
            "gray",
            "--max-tile-count",
            "9",
        ]);
        let config = args.config().unwrap();
        assert_eq!(config.colormap, "gray");
        assert_eq!(config.max_tile_count, 9);

        let request = args.request(&config);
        assert_eq!(request.threshold, DensityThreshold::Uniform);
        assert_eq!(request.bounds, BoundingBox::from_lat_lon(-34.1, -33.8, 18.3, 18.6));
        assert_eq!(args.year, YearFilter::Year(2021));
    }

    #[test]
    fn test_bad_colormap_rejected() {
        let args = Args::parse_from(["heatmap", "--colormap", "jet"]);
        assert!(args.config().is_err());
    }
}
