//! The heatmap rendering pipeline.
//!
//! Stages, in order:
//! 1. Clamp the zoom and crop trackpoints to the requested bounds
//! 2. Gate on the number of tiles before any network access
//! 3. Fetch tiles sequentially and stitch them into a mosaic
//! 4. Accumulate, threshold and smooth the density field
//! 5. Colorize and composite onto the inverted grayscale map

use heatmap_common::tile::{clamp_zoom, is_valid_mercator_lat, tile_to_latlon};
use heatmap_common::{
    BoundingBox, Grid, HeatmapError, HeatmapResult, TileCoord, TileRange, TrackSet,
};
use renderer::composite::{colorize, composite, normalize};
use renderer::density::{accumulate, apply_ceiling, DensityLayout, DensityThreshold};
use renderer::mosaic::{decode_tile, to_inverted_grayscale, Mosaic};
use renderer::smoothing::{box_width_for_sigma, smooth};
use renderer::{Colormap, RgbRaster};
use tracing::{debug, info, instrument, warn};

use crate::config::HeatmapConfig;
use crate::fetch::TileFetcher;

/// Parameters of a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Requested zoom, clamped to the configured maximum
    pub zoom: u32,
    /// Gaussian sigma in pixels; also the padding around each trackpoint
    pub sigma: u32,
    /// Only points strictly inside these bounds are rendered
    pub bounds: BoundingBox,
    pub threshold: DensityThreshold,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            zoom: 10,
            sigma: 1,
            bounds: BoundingBox::world(),
            threshold: DensityThreshold::default(),
        }
    }
}

/// Everything decided before the first tile is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub zoom: u32,
    /// Tracks surviving the crop
    pub tracks: TrackSet,
    pub range: TileRange,
}

/// Result of a render.
#[derive(Debug, Clone)]
pub struct HeatmapOutput {
    /// Composited image, mosaic-sized
    pub image: RgbRaster,
    /// Smoothed density normalized to [0, 1]
    pub density: Grid,
    /// Raw accumulation after the ceiling, before smoothing
    pub thresholded: Grid,
    pub range: TileRange,
    pub tile_size: u32,
    /// Tiles replaced by a white fallback
    pub fallback_tiles: usize,
}

/// One exported density cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityCell {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

impl HeatmapOutput {
    /// Cells whose normalized density exceeds `threshold`, row by row.
    ///
    /// Coordinates are those of each pixel's top-left corner.
    pub fn visible_cells(&self, threshold: f64) -> impl Iterator<Item = DensityCell> + '_ {
        let (x_min, y_min) = self.range.origin();
        let tile_size = self.tile_size as f64;
        let zoom = self.range.zoom;

        self.density
            .cells()
            .filter(move |&(_, _, v)| v > threshold)
            .map(move |(row, col, intensity)| {
                let x = x_min + col as f64 / tile_size;
                let y = y_min + row as f64 / tile_size;
                let (lat, lon) = tile_to_latlon(x, y, zoom);
                DensityCell {
                    lat,
                    lon,
                    intensity,
                }
            })
    }
}

/// Renders track sets against one tile source.
pub struct HeatmapPipeline<F> {
    config: HeatmapConfig,
    colormap: Colormap,
    fetcher: F,
}

impl<F: TileFetcher> HeatmapPipeline<F> {
    pub fn new(config: HeatmapConfig, fetcher: F) -> HeatmapResult<Self> {
        config.validate()?;
        let colormap = config.colormap()?;
        Ok(Self {
            config,
            colormap,
            fetcher,
        })
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Clamp, crop and size the render without touching the network.
    pub fn plan(&self, tracks: &TrackSet, request: &RenderRequest) -> HeatmapResult<RenderPlan> {
        let zoom = clamp_zoom(request.zoom, self.config.max_zoom);
        if zoom != request.zoom {
            info!(requested = request.zoom, zoom = zoom, "Zoom clamped");
        }

        if tracks.is_empty() {
            return Err(HeatmapError::NoTrackPoints("the selected sources".to_string()));
        }

        let mut cropped = tracks.clone();
        cropped.retain(|p| {
            request.bounds.contains_open(p.lat, p.lon) && is_valid_mercator_lat(p.lat)
        });

        let bbox = cropped
            .bounds()
            .ok_or_else(|| HeatmapError::NoPointsInBounds(request.bounds.to_string()))?;
        debug!(
            kept = cropped.len(),
            dropped = tracks.len() - cropped.len(),
            "Cropped trackpoints"
        );

        let range = TileRange::from_bbox(&bbox, zoom);
        let count = range.count();
        if count > self.config.max_tile_count {
            return Err(HeatmapError::TooManyTiles {
                count,
                max: self.config.max_tile_count,
            });
        }

        Ok(RenderPlan {
            zoom,
            tracks: cropped,
            range,
        })
    }

    /// Fetch every tile of `range` and stitch them together.
    ///
    /// Tiles that fail to fetch or decode are replaced by white tiles.
    /// Returns the mosaic and the number of replaced tiles.
    #[instrument(skip(self), fields(tiles = range.count()))]
    pub async fn assemble_mosaic(&self, range: &TileRange) -> HeatmapResult<(Mosaic, usize)> {
        let tile_size = self.config.tile_size;
        let total = range.count();
        let mut mosaic = Mosaic::new(*range, tile_size);
        let mut fallbacks = 0;

        for (i, tile) in range.tiles().enumerate() {
            debug!(tile = %tile, n = i + 1, total = total, "Loading tile");
            let image = match self.load_tile(tile).await {
                Ok(image) => image,
                Err(e) if e.is_recoverable() => {
                    warn!(tile = %tile, error = %e, "Using blank tile");
                    fallbacks += 1;
                    RgbRaster::white(tile_size as usize)
                }
                Err(e) => return Err(e),
            };
            mosaic.place(tile, &image)?;
        }

        Ok((mosaic, fallbacks))
    }

    async fn load_tile(&self, tile: TileCoord) -> HeatmapResult<RgbRaster> {
        let bytes = self.fetcher.fetch(tile).await?;
        decode_tile(tile, &bytes, self.config.tile_size)
    }

    /// Produce the composited heatmap for a track set.
    #[instrument(
        skip(self, tracks),
        fields(points = tracks.len(), activities = tracks.activity_count)
    )]
    pub async fn render(
        &self,
        tracks: &TrackSet,
        request: &RenderRequest,
    ) -> HeatmapResult<HeatmapOutput> {
        let plan = self.plan(tracks, request)?;
        let range = plan.range;
        info!(
            zoom = plan.zoom,
            columns = range.columns(),
            rows = range.rows(),
            "Rendering heatmap"
        );

        let (mosaic, fallback_tiles) = self.assemble_mosaic(&range).await?;
        let base = to_inverted_grayscale(mosaic.raster());

        let tile_size = self.config.tile_size;
        let layout = DensityLayout {
            width: range.pixel_width(tile_size),
            height: range.pixel_height(tile_size),
            zoom: plan.zoom,
            origin: range.origin(),
            tile_size,
        };

        let mut thresholded = accumulate(&plan.tracks.points, &layout, request.sigma as usize);

        let mean_lat = plan.tracks.mean_latitude().unwrap_or(0.0);
        let ceiling = request
            .threshold
            .ceiling(plan.zoom, mean_lat, plan.tracks.activity_count);
        debug!(ceiling = ceiling, "Density ceiling");
        apply_ceiling(&mut thresholded, ceiling);

        let window = box_width_for_sigma(request.sigma as f64);
        let density = normalize(&smooth(&thresholded, window));

        let overlay = colorize(&density, self.colormap);
        let image = composite(&base, &overlay)?;

        info!(
            width = image.width(),
            height = image.height(),
            fallback_tiles = fallback_tiles,
            "Heatmap rendered"
        );

        Ok(HeatmapOutput {
            image,
            density,
            thresholded,
            range,
            tile_size,
            fallback_tiles,
        })
    }
}
